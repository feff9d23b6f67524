//! Job Runner
//!
//! Executes one job: seed discovery through the web search provider, then a
//! single call into the research engine. Every site reaches the store through
//! the runner's deduplicator, in discovery order.
//!
//! [`JobRunner::execute`] returns the engine's outcome instead of writing it;
//! the orchestrator maps that outcome to the job's terminal state.

use super::{JobError, JobId, JobStore, SiteDeduplicator};
use crate::research::{ResearchEngine, ResearchParams, SiteSink};
use crate::tools::search::WebSearchProvider;
use crate::types::{Result, Site};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error};

/// Execution parameters captured when a job is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Candidate sources requested from the search provider before research starts
    pub seed_results: usize,
    pub research: ResearchParams,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            seed_results: 5,
            research: ResearchParams::default(),
        }
    }
}

/// Runs a single job against the shared store.
#[derive(Clone)]
pub struct JobRunner {
    store: Arc<JobStore>,
    search: Arc<dyn WebSearchProvider>,
    engine: Arc<dyn ResearchEngine>,
    settings: JobSettings,
}

impl JobRunner {
    pub fn new(
        store: Arc<JobStore>,
        search: Arc<dyn WebSearchProvider>,
        engine: Arc<dyn ResearchEngine>,
        settings: JobSettings,
    ) -> Self {
        Self {
            store,
            search,
            engine,
            settings,
        }
    }

    /// Seed the job with search results, then run the research engine.
    ///
    /// Returns the engine's summary. Provider and engine failures are returned
    /// as errors; the job record is left for the caller to finalize.
    pub async fn execute(&self, id: JobId, topic: &str) -> Result<String> {
        let sink = JobSiteSink::new(Arc::clone(&self.store), id);

        let hits = self
            .search
            .search(topic, self.settings.seed_results)
            .await?;
        debug!(job_id = %id, "Search returned {} seed sources", hits.len());

        for hit in &hits {
            sink.offer(hit.site())?;
        }

        self.engine
            .run(topic, &self.settings.research, &sink)
            .await
    }
}

/// Routes discovered sites through a deduplicator into the job store.
struct JobSiteSink {
    store: Arc<JobStore>,
    id: JobId,
    seen: Mutex<SiteDeduplicator>,
}

impl JobSiteSink {
    fn new(store: Arc<JobStore>, id: JobId) -> Self {
        Self {
            store,
            id,
            seen: Mutex::new(SiteDeduplicator::new()),
        }
    }

    /// Append the site unless it was already reported. Returns whether it was new.
    fn offer(&self, site: Site) -> std::result::Result<bool, JobError> {
        // Held across the append so concurrent reports keep discovery order.
        let mut seen = self.seen.lock();
        if !seen.is_new(&site) {
            return Ok(false);
        }
        debug!(job_id = %self.id, url = %site.url, "Discovered site");
        self.store.append_site(self.id, site)
    }
}

impl SiteSink for JobSiteSink {
    fn report(&self, site: Site) {
        if let Err(e) = self.offer(site) {
            error!(job_id = %self.id, "Failed to record discovered site: {}", e);
        }
    }
}
