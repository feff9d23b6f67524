//! Multi-Round Research Engine
//!
//! The research engine turns a topic into a synthesized summary by iterating
//! over query formulation, web retrieval and summarization. Job execution
//! treats it as an opaque, long-running call that returns a single outcome.
//!
//! # Architecture
//!
//! - [`ResearchEngine`] - The seam the job runner calls, once per job
//! - [`SiteSink`] - Receives every source the engine discovers while it runs
//! - [`coordinator::ResearchCoordinator`] - LLM-backed engine implementation
//!
//! # Research Workflow
//!
//! 1. **Query Generation** - Turn the topic into a focused web search query
//! 2. **Web Research** - Search and (optionally) fetch full pages
//! 3. **Summarization** - Fold the new sources into a running summary
//! 4. **Reflection** - Find a knowledge gap and formulate a follow-up query
//! 5. **Finalization** - Append the list of sources after the last round

/// LLM-backed research coordination.
pub mod coordinator;

pub use coordinator::ResearchCoordinator;

use crate::types::{Result, Site};
use async_trait::async_trait;

/// Per-job engine parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchParams {
    /// Maximum number of search-and-summarize rounds
    pub round_budget: u32,
    /// Search hits requested per round
    pub results_per_round: usize,
    /// Fetch full page content instead of using search snippets
    pub fetch_full_page: bool,
    /// Remove `<think>` blocks from model output
    pub strip_thinking_tokens: bool,
}

impl Default for ResearchParams {
    fn default() -> Self {
        Self {
            round_budget: 2,
            results_per_round: 3,
            fetch_full_page: true,
            strip_thinking_tokens: true,
        }
    }
}

/// Receiver for sources discovered while an engine runs.
pub trait SiteSink: Send + Sync {
    fn report(&self, site: Site);
}

/// Opaque research capability: topic in, summary out.
#[async_trait]
pub trait ResearchEngine: Send + Sync {
    async fn run(&self, topic: &str, params: &ResearchParams, sites: &dyn SiteSink)
        -> Result<String>;
}
