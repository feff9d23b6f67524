//! Web search provider backed by daedra
//!
//! This module resolves a query into a ranked list of candidate sources using
//! the daedra crate, which uses DuckDuckGo as the search backend.

use crate::types::{AppError, Result, Site};
use async_trait::async_trait;

const UNKNOWN_TITLE: &str = "Unknown Site";
const UNKNOWN_URL: &str = "#";

/// One ranked search result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    /// The site this hit points at, with placeholders for missing fields.
    pub fn site(&self) -> Site {
        let title = if self.title.trim().is_empty() {
            UNKNOWN_TITLE
        } else {
            self.title.as_str()
        };
        let url = if self.url.trim().is_empty() {
            UNKNOWN_URL
        } else {
            self.url.as_str()
        };
        Site::new(title, url)
    }
}

/// Resolves a query into an ordered list of candidate sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Search for at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Fetch a page and return its text content.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// DuckDuckGo search powered by daedra
#[derive(Debug, Default, Clone)]
pub struct DuckDuckGoSearch;

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Missing search query".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title.to_string(),
                url: r.url.to_string(),
                snippet: r.description.to_string(),
            })
            .collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        let page = daedra::tools::fetch::fetch_page(&fetch_args)
            .await
            .map_err(|e| AppError::Search(format!("Failed to fetch page: {}", e)))?;

        Ok(page.content)
    }
}
