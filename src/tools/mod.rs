//! External tools used by the research workflow
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search and page fetching (DuckDuckGo via daedra)
//!
//! # Web Search
//!
//! ```ignore
//! let provider = DuckDuckGoSearch::new();
//! for hit in provider.search("rust programming", 5).await? {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Web search provider abstraction and DuckDuckGo implementation.
pub mod search;

pub use search::{DuckDuckGoSearch, SearchHit, WebSearchProvider};
