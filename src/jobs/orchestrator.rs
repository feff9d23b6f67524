//! Orchestrator
//!
//! Accepts research requests, allocates job ids, starts one runner task per
//! job and serves status snapshots. Creation returns immediately; the job
//! progresses in the background and is observed by polling.

use super::{JobError, JobId, JobRunner, JobSettings, JobStore};
use crate::research::ResearchEngine;
use crate::tools::search::WebSearchProvider;
use crate::types::{AppError, ResearchCreated, ResearchStatus, Result, StatusResponse};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct Orchestrator {
    store: Arc<JobStore>,
    search: Arc<dyn WebSearchProvider>,
    engine: Arc<dyn ResearchEngine>,
    settings: JobSettings,
    /// Admission limit on concurrently running jobs; `None` means unbounded
    admission: Option<Arc<Semaphore>>,
}

impl Orchestrator {
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
            admission: None,
        }
    }

    /// Reject new jobs while `limit` jobs are still running.
    pub fn with_job_limit(mut self, limit: usize) -> Self {
        self.admission = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Start a research job with the orchestrator's default settings.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create_research(&self, topic: &str) -> Result<ResearchCreated> {
        self.create_research_with(topic, self.settings.clone())
    }

    /// Start a research job with explicit settings.
    pub fn create_research_with(
        &self,
        topic: &str,
        settings: JobSettings,
    ) -> Result<ResearchCreated> {
        self.launch(topic, settings).map(|(created, _)| created)
    }

    /// Like [`create_research_with`](Self::create_research_with), also
    /// returning the handle of the background task.
    pub fn launch(
        &self,
        topic: &str,
        settings: JobSettings,
    ) -> Result<(ResearchCreated, JoinHandle<()>)> {
        if topic.trim().is_empty() {
            return Err(JobError::Validation("Research topic is required".to_string()).into());
        }

        let permit = self.admit()?;

        let id = JobId::new();
        self.store.create(id, topic)?;
        info!(
            job_id = %id,
            active = self.store.active_count(),
            total = self.store.len(),
            "Research job started: {}",
            topic
        );

        let runner = JobRunner::new(
            Arc::clone(&self.store),
            Arc::clone(&self.search),
            Arc::clone(&self.engine),
            settings,
        );
        let handle = spawn_job(Arc::clone(&self.store), runner, id, topic.to_string(), permit);

        Ok((
            ResearchCreated {
                id: id.to_string(),
                status: ResearchStatus::Running,
            },
            handle,
        ))
    }

    /// Current state of a job. Unknown or malformed ids are reported with
    /// status `not_found` rather than as an error.
    pub fn get_status(&self, id: &str) -> StatusResponse {
        id.parse::<JobId>()
            .ok()
            .and_then(|job_id| self.store.snapshot(job_id))
            .map(|job| job.into_status_response())
            .unwrap_or_else(|| StatusResponse {
                id: id.to_string(),
                status: ResearchStatus::NotFound,
                result: String::new(),
                sites: Vec::new(),
            })
    }

    fn admit(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match &self.admission {
            None => Ok(None),
            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => Ok(Some(permit)),
                Err(_) => {
                    warn!("Rejecting research job: concurrent job limit reached");
                    Err(AppError::Busy(
                        "Too many research jobs running, try again later".to_string(),
                    ))
                }
            },
        }
    }
}

/// Run the job on its own task and record its terminal state.
///
/// The workflow runs on an inner task so that a panic inside it surfaces as a
/// `JoinError` and still fails the job.
fn spawn_job(
    store: Arc<JobStore>,
    runner: JobRunner,
    id: JobId,
    topic: String,
    permit: Option<OwnedSemaphorePermit>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _permit = permit;

        let workflow = tokio::spawn(async move { runner.execute(id, &topic).await });
        let outcome = match workflow.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AppError::Internal(format!("research task aborted: {}", e))),
        };

        settle(&store, id, outcome);
    })
}

/// Map a runner outcome to the job's terminal state.
fn settle(store: &JobStore, id: JobId, outcome: Result<String>) {
    let recorded = match outcome {
        Ok(summary) => store.complete(id, summary).map(|job| {
            info!(
                job_id = %id,
                sites = job.sites.len(),
                elapsed_ms = job.elapsed().num_milliseconds(),
                "Research job completed"
            );
        }),
        Err(e) => store.fail(id, format!("Error: {}", e)).map(|job| {
            warn!(
                job_id = %id,
                elapsed_ms = job.elapsed().num_milliseconds(),
                "Research job failed: {}",
                e
            );
        }),
    };

    if let Err(e) = recorded {
        error!(job_id = %id, "Could not record job outcome: {}", e);
    }
}
