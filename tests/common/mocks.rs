//! Mock implementations for testing.
//!
//! Search providers, research engines and LLM clients that can be used
//! across different test files without touching the network.

use async_trait::async_trait;
use delve::{
    llm::LLMClient,
    research::{ResearchEngine, ResearchParams, SiteSink},
    tools::{SearchHit, WebSearchProvider},
    types::{AppError, Result, Site},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Search provider returning the same hits for every query.
#[derive(Clone, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    should_fail: bool,
}

impl StaticSearch {
    pub fn new(hits: &[(&str, &str)]) -> Self {
        Self {
            hits: hits
                .iter()
                .map(|(title, url)| SearchHit {
                    title: title.to_string(),
                    url: url.to_string(),
                    snippet: format!("About {}", title),
                })
                .collect(),
            should_fail: false,
        }
    }

    /// A provider whose every search fails.
    pub fn failing() -> Self {
        Self {
            hits: vec![],
            should_fail: true,
        }
    }
}

#[async_trait]
impl WebSearchProvider for StaticSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if self.should_fail {
            return Err(AppError::Search("search backend unavailable".to_string()));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        Ok(format!("Page content of {}", url))
    }
}

fn slug(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "-")
}

/// Search provider whose single hit is unique to the query and the call.
#[derive(Default)]
pub struct PerQuerySearch {
    calls: AtomicUsize,
}

#[async_trait]
impl WebSearchProvider for PerQuerySearch {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SearchHit {
            title: query.to_string(),
            url: format!("https://seed.example/{}/{}", slug(query), n),
            snippet: format!("About {}", query),
        }])
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        Ok(format!("Page content of {}", url))
    }
}

/// Engine that reports its sites, then blocks until released.
///
/// Site URLs and the summary may contain `{topic}` and `{run}` placeholders,
/// filled with the topic's slug and a per-engine run counter.
///
/// Each call to [`GatedEngine::release`] lets one pending run finish.
pub struct GatedEngine {
    sites: Vec<Site>,
    gate: Arc<Semaphore>,
    outcome: std::result::Result<String, String>,
    runs: AtomicUsize,
}

impl GatedEngine {
    pub fn succeeding(sites: &[(&str, &str)], summary: &str) -> Self {
        Self::with_outcome(sites, Ok(summary.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(&[], Err(message.to_string()))
    }

    fn with_outcome(sites: &[(&str, &str)], outcome: std::result::Result<String, String>) -> Self {
        Self {
            sites: sites.iter().map(|(t, u)| Site::new(*t, *u)).collect(),
            gate: Arc::new(Semaphore::new(0)),
            outcome,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ResearchEngine for GatedEngine {
    async fn run(
        &self,
        topic: &str,
        _params: &ResearchParams,
        sites: &dyn SiteSink,
    ) -> Result<String> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst).to_string();
        let fill = |text: &str| text.replace("{topic}", &slug(topic)).replace("{run}", &run);

        for site in &self.sites {
            sites.report(Site::new(fill(&site.title), fill(&site.url)));
        }

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        permit.forget();

        self.outcome
            .as_ref()
            .map(|summary| fill(summary))
            .map_err(|message| AppError::LLM(message.clone()))
    }
}

/// LLM client returning a fixed response to every prompt.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
