//! Background Research Jobs
//!
//! This module owns the lifecycle of research jobs: identity, state, execution
//! and the polling contract.
//!
//! # Architecture
//!
//! - [`store::JobStore`] - Authoritative, concurrency-safe job state
//! - [`dedup::SiteDeduplicator`] - Per-job bookkeeping of reported URLs
//! - [`runner::JobRunner`] - Executes one job end-to-end (seed, research, finalize)
//! - [`orchestrator::Orchestrator`] - Accepts new jobs and serves status snapshots
//!
//! # Lifecycle
//!
//! ```text
//! pending -> running -> completed
//!                    \-> error
//! ```
//!
//! Transitions are monotonic. A terminal job never changes again, and a job id,
//! once issued, resolves to its record for the lifetime of the process.
//!
//! # Usage
//!
//! ```ignore
//! use delve::jobs::{Orchestrator, JobStore};
//!
//! let orchestrator = Orchestrator::new(store, search, engine, settings);
//! let created = orchestrator.create_research("quantum computing")?;
//!
//! let status = orchestrator.get_status(&created.id);
//! println!("{:?}: {} sources", status.status, status.sites.len());
//! ```

/// Per-job URL deduplication.
pub mod dedup;
/// Job creation and status polling.
pub mod orchestrator;
/// Single-job execution.
pub mod runner;
/// Concurrency-safe job registry.
pub mod store;

pub use dedup::SiteDeduplicator;
pub use orchestrator::Orchestrator;
pub use runner::{JobRunner, JobSettings};
pub use store::JobStore;

use crate::types::{ResearchStatus, Site, StatusResponse};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque job identifier.
///
/// Always freshly generated, never derived from the request payload, so two
/// submissions of the same topic get two independent jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Internal job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl From<JobStatus> for ResearchStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Running => ResearchStatus::Running,
            JobStatus::Completed => ResearchStatus::Completed,
            JobStatus::Error => ResearchStatus::Error,
        }
    }
}

/// Immutable copy of a job's state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub topic: String,
    pub status: JobStatus,
    /// Summary when completed, failure description when errored, empty otherwise
    pub result: String,
    /// Discovered sources in discovery order, unique by URL
    pub sites: Vec<Site>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Time from creation until the job finished, or until now while it runs.
    pub fn elapsed(&self) -> TimeDelta {
        self.finished_at.unwrap_or_else(Utc::now) - self.created_at
    }

    /// Convert into the polling view.
    pub fn into_status_response(self) -> StatusResponse {
        let result = if self.status.is_terminal() {
            self.result
        } else {
            String::new()
        };

        StatusResponse {
            id: self.id.to_string(),
            status: self.status.into(),
            result,
            sites: self.sites,
        }
    }
}

/// Job store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job already exists: {0}")]
    Duplicate(JobId),

    #[error("Job {id} is already {status:?}")]
    InvalidTransition { id: JobId, status: JobStatus },
}
