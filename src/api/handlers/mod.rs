//! API request handlers.

/// Research job creation and status polling handlers.
pub mod research;
