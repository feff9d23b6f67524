//! # Delve - Asynchronous Research Server
//!
//! Delve accepts a research topic over HTTP, runs a web research job for it in
//! the background and lets clients poll the job for progress: discovered source
//! sites appear while the job runs, and the final summary appears once it
//! completes.
//!
//! ## Overview
//!
//! Delve can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `delve-server` binary
//! 2. **As a library** - Embed the [`Orchestrator`] in your own service
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use delve::{
//!     jobs::{JobSettings, JobStore, Orchestrator},
//!     research::ResearchCoordinator,
//!     tools::DuckDuckGoSearch,
//!     Provider,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "llama3.2".to_string(),
//!     };
//!     let llm = provider.create_client().await?;
//!     let search = Arc::new(DuckDuckGoSearch::new());
//!     let engine = Arc::new(ResearchCoordinator::new(llm, search.clone()));
//!
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(JobStore::new()),
//!         search,
//!         engine,
//!         JobSettings::default(),
//!     );
//!
//!     let created = orchestrator.create_research("rust async runtimes")?;
//!     let status = orchestrator.get_status(&created.id);
//!     println!("{:?}", status.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI-compatible API support (default) |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`jobs`] - Job store, site deduplication, runner and orchestrator
//! - [`research`] - LLM-driven research loop
//! - [`tools`] - Web search providers
//! - [`llm`] - LLM client implementations
//! - [`api`] - REST API handlers and routes
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot reloading

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface for the `delve-server` binary.
pub mod cli;
/// Background research jobs.
pub mod jobs;
/// LLM provider clients and abstractions.
pub mod llm;
/// Iterative web research driven by an LLM.
pub mod research;
/// Web search providers.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use jobs::{JobStore, Orchestrator};
pub use llm::{LLMClient, Provider};
pub use research::{ResearchCoordinator, ResearchEngine};
pub use types::{AppError, Result};
pub use utils::toml_config::{DelveConfig, DelveConfigManager};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<DelveConfigManager>,
    /// Owner of all research jobs
    pub orchestrator: Arc<Orchestrator>,
}
