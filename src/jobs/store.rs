//! Job Store
//!
//! Authoritative state for every job. One writer (the job's runner) and any
//! number of readers (pollers) share it.
//!
//! Locking is two-level: the outer map lock is held only long enough to look
//! up or insert a record handle, and each record has its own mutex. Mutations
//! and snapshots on one job are atomic with respect to each other, while
//! operations on different jobs never contend beyond the map lookup.

use super::{Job, JobError, JobId, JobStatus, SiteDeduplicator};
use crate::types::Site;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

struct JobRecord {
    job: Job,
    seen: SiteDeduplicator,
}

/// Concurrency-safe mapping from job id to job state.
///
/// Records are never evicted; an issued id resolves for the lifetime of the
/// store.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<JobRecord>>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new running job with an empty result and no sites.
    pub fn create(&self, id: JobId, topic: impl Into<String>) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&id) {
            return Err(JobError::Duplicate(id));
        }

        let job = Job {
            id,
            topic: topic.into(),
            status: JobStatus::Running,
            result: String::new(),
            sites: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        };

        jobs.insert(
            id,
            Arc::new(Mutex::new(JobRecord {
                job: job.clone(),
                seen: SiteDeduplicator::new(),
            })),
        );

        Ok(job)
    }

    /// Append a discovered site.
    ///
    /// Returns `Ok(false)` without modifying the job when the URL is already
    /// present. Terminal jobs are frozen and reject further sites.
    pub fn append_site(&self, id: JobId, site: Site) -> Result<bool, JobError> {
        let record = self.record(id)?;
        let mut record = record.lock();

        if record.job.status.is_terminal() {
            return Err(JobError::InvalidTransition {
                id,
                status: record.job.status,
            });
        }

        if !record.seen.is_new(&site) {
            return Ok(false);
        }

        record.job.sites.push(site);
        Ok(true)
    }

    /// Mark the job completed with its summary.
    pub fn complete(&self, id: JobId, result: impl Into<String>) -> Result<Job, JobError> {
        self.finish(id, JobStatus::Completed, result.into())
    }

    /// Mark the job failed with a human-readable description.
    pub fn fail(&self, id: JobId, message: impl Into<String>) -> Result<Job, JobError> {
        self.finish(id, JobStatus::Error, message.into())
    }

    /// Copy of the job's current state, or `None` for an unknown id.
    pub fn snapshot(&self, id: JobId) -> Option<Job> {
        let record = self.jobs.read().get(&id).cloned()?;
        let job = record.lock().job.clone();
        Some(job)
    }

    /// Number of jobs ever created.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Number of jobs that have not reached a terminal status.
    pub fn active_count(&self) -> usize {
        let handles: Vec<_> = self.jobs.read().values().cloned().collect();
        handles
            .iter()
            .filter(|record| !record.lock().job.status.is_terminal())
            .count()
    }

    fn finish(&self, id: JobId, status: JobStatus, result: String) -> Result<Job, JobError> {
        let record = self.record(id)?;
        let mut record = record.lock();

        if record.job.status.is_terminal() {
            return Err(JobError::InvalidTransition {
                id,
                status: record.job.status,
            });
        }

        record.job.status = status;
        record.job.result = result;
        record.job.finished_at = Some(Utc::now());
        Ok(record.job.clone())
    }

    fn record(&self, id: JobId) -> Result<Arc<Mutex<JobRecord>>, JobError> {
        self.jobs
            .read()
            .get(&id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn site(n: usize) -> Site {
        Site::new(format!("Site {}", n), format!("https://example.com/{}", n))
    }

    #[test]
    fn test_create_inserts_running_job() {
        let store = JobStore::new();
        let id = JobId::new();

        let job = store.create(id, "quantum computing").unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.result.is_empty());
        assert!(job.sites.is_empty());

        let snapshot = store.snapshot(id).unwrap();
        assert_eq!(snapshot, job);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_duplicate_id_fails() {
        let store = JobStore::new();
        let id = JobId::new();
        store.create(id, "first").unwrap();

        let err = store.create(id, "second").unwrap_err();
        assert_eq!(err, JobError::Duplicate(id));
        assert_eq!(store.snapshot(id).unwrap().topic, "first");
    }

    #[test]
    fn test_append_site_dedups_by_url() {
        let store = JobStore::new();
        let id = JobId::new();
        store.create(id, "topic").unwrap();

        assert!(store.append_site(id, site(1)).unwrap());
        assert!(store.append_site(id, site(2)).unwrap());
        assert!(!store
            .append_site(id, Site::new("Other title", "https://example.com/1"))
            .unwrap());

        let sites = store.snapshot(id).unwrap().sites;
        assert_eq!(sites, vec![site(1), site(2)]);
    }

    #[test]
    fn test_append_site_unknown_job() {
        let store = JobStore::new();
        let id = JobId::new();
        assert_eq!(
            store.append_site(id, site(1)).unwrap_err(),
            JobError::NotFound(id)
        );
    }

    #[test]
    fn test_complete_sets_terminal_state() {
        let store = JobStore::new();
        let id = JobId::new();
        store.create(id, "topic").unwrap();

        let job = store.complete(id, "Summary text").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, "Summary text");
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_terminal_job_rejects_transitions() {
        let store = JobStore::new();
        let id = JobId::new();
        store.create(id, "topic").unwrap();
        store.fail(id, "Error: boom").unwrap();

        let err = store.complete(id, "late summary").unwrap_err();
        assert_eq!(
            err,
            JobError::InvalidTransition {
                id,
                status: JobStatus::Error
            }
        );
        assert!(store.fail(id, "again").is_err());
        assert!(store.append_site(id, site(1)).is_err());

        let job = store.snapshot(id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.result, "Error: boom");
        assert!(job.sites.is_empty());
    }

    #[test]
    fn test_complete_unknown_job() {
        let store = JobStore::new();
        let id = JobId::new();
        assert_eq!(store.complete(id, "x").unwrap_err(), JobError::NotFound(id));
        assert!(store.snapshot(id).is_none());
    }

    #[test]
    fn test_active_count_tracks_terminal_jobs() {
        let store = JobStore::new();
        let a = JobId::new();
        let b = JobId::new();
        store.create(a, "a").unwrap();
        store.create(b, "b").unwrap();
        assert_eq!(store.active_count(), 2);

        store.complete(a, "done").unwrap();
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_readers_see_prefix_stable_sites() {
        let store = Arc::new(JobStore::new());
        let id = JobId::new();
        store.create(id, "topic").unwrap();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..200 {
                    store.append_site(id, site(n)).unwrap();
                    store.append_site(id, site(n)).unwrap();
                }
                store.complete(id, "done").unwrap();
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut previous: Vec<Site> = Vec::new();
                    loop {
                        let job = store.snapshot(id).unwrap();
                        assert!(job.sites.starts_with(&previous));
                        let mut urls: Vec<_> = job.sites.iter().map(|s| &s.url).collect();
                        urls.sort();
                        urls.dedup();
                        assert_eq!(urls.len(), job.sites.len());
                        if job.status.is_terminal() {
                            assert_eq!(job.sites.len(), 200);
                            break;
                        }
                        previous = job.sites;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
