//! Job registry
//!
//! Every submission becomes a [`Job`] keyed by its id, so one user's upload
//! can never replace another's text. Any number of jobs may wait, but only
//! one runs at a time: starting a second run while one is active is refused
//! with a conflict rather than queued.
//!
//! The registry holds a bounded number of jobs. Once a submission takes it
//! over the bound, the oldest jobs that are not running are forgotten.

use crate::editing::{CancelSignal, EditorPipeline, RunRequest};
use crate::types::{AppError, JobResponse, JobStatus, Progress, Result, RunSummary};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Jobs kept when no bound is configured
pub const DEFAULT_MAX_RETAINED_JOBS: usize = 32;

/// A submitted text and everything known about its processing.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub text: Arc<str>,
    /// Uploaded file names; empty for pasted text
    pub sources: Vec<String>,
    pub estimated_chunks: usize,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    pub progress: Progress,
    pub error: Option<String>,
    pub summary: Option<RunSummary>,
}

impl Job {
    pub fn to_response(&self, seconds_per_chunk: u64) -> JobResponse {
        JobResponse {
            job_id: self.id,
            status: self.status,
            characters: self.text.chars().count(),
            sources: self.sources.clone(),
            estimated_chunks: self.estimated_chunks,
            estimated_wait_secs: self.estimated_chunks as u64 * seconds_per_chunk,
            progress: self.progress,
            percent: self.progress.percent(),
            created_at: self.created_at,
            error: self.error.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// Permission to run one job, handed out by [`JobRegistry::start`].
#[derive(Debug)]
pub struct RunTicket {
    pub job_id: Uuid,
    pub text: Arc<str>,
    pub estimated_chunks: usize,
    pub cancel: CancelSignal,
}

/// The run whose output is the current artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRun {
    pub job_id: Uuid,
    pub sources: Vec<String>,
}

#[derive(Debug)]
struct ActiveRun {
    job_id: Uuid,
    cancel: CancelSignal,
}

#[derive(Debug, Default)]
struct JobTable {
    by_id: HashMap<Uuid, Job>,
    /// Submission order, oldest first
    order: VecDeque<Uuid>,
}

impl JobTable {
    fn insert(&mut self, job: Job) {
        self.order.push_back(job.id);
        self.by_id.insert(job.id, job);
    }

    /// Forget the oldest jobs that are not running until at most `limit`
    /// remain. `keep` is never forgotten.
    fn evict_idle(&mut self, limit: usize, keep: Uuid) -> usize {
        let mut evicted = 0;
        while self.by_id.len() > limit {
            let oldest = self.order.iter().position(|id| {
                *id != keep
                    && self
                        .by_id
                        .get(id)
                        .is_some_and(|job| job.status != JobStatus::Running)
            });
            let Some(position) = oldest else { break };
            if let Some(id) = self.order.remove(position) {
                self.by_id.remove(&id);
                evicted += 1;
            }
        }
        evicted
    }
}

/// Lock order: `active`, then `jobs`, then `published`.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<JobTable>,
    active: Mutex<Option<ActiveRun>>,
    published: Mutex<Option<PublishedRun>>,
    max_retained: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_MAX_RETAINED_JOBS)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that keeps at most `max_retained` jobs, not counting the
    /// running one and the newest submission.
    pub fn with_retention(max_retained: usize) -> Self {
        Self {
            jobs: RwLock::new(JobTable::default()),
            active: Mutex::new(None),
            published: Mutex::new(None),
            max_retained: max_retained.max(1),
        }
    }

    /// Register a new job. Blank text is rejected.
    pub fn submit(&self, text: String, sources: Vec<String>, estimated_chunks: usize) -> Result<Job> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(if sources.is_empty() {
                "Text box is blank".to_string()
            } else {
                "Uploaded documents contain no text".to_string()
            }));
        }

        let job = Job {
            id: Uuid::new_v4(),
            text: Arc::from(text),
            sources,
            estimated_chunks,
            created_at: Utc::now(),
            status: JobStatus::Pending,
            progress: Progress::new(estimated_chunks),
            error: None,
            summary: None,
        };

        info!(
            job_id = %job.id,
            characters = job.text.len(),
            estimated_chunks,
            "Job submitted"
        );

        let mut jobs = self.jobs.write();
        jobs.insert(job.clone());
        let evicted = jobs.evict_idle(self.max_retained, job.id);
        if evicted > 0 {
            debug!(evicted, retained = jobs.by_id.len(), "Forgot oldest idle jobs");
        }

        Ok(job)
    }

    pub fn get(&self, id: Uuid) -> Result<Job> {
        self.jobs
            .read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job '{}' not found", id)))
    }

    pub fn active_job(&self) -> Option<Uuid> {
        self.active.lock().as_ref().map(|run| run.job_id)
    }

    /// The last run that completed and replaced the artifact.
    pub fn last_published(&self) -> Option<PublishedRun> {
        self.published.lock().clone()
    }

    /// Mark a job running. Fails with `Conflict` while any run is active.
    pub fn start(&self, id: Uuid) -> Result<RunTicket> {
        let mut active = self.active.lock();
        if let Some(run) = active.as_ref() {
            return Err(AppError::Conflict(format!(
                "Job '{}' is already running; wait for it to finish or cancel it",
                run.job_id
            )));
        }

        let mut jobs = self.jobs.write();
        let job = jobs
            .by_id
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Job '{}' not found", id)))?;

        job.status = JobStatus::Running;
        job.progress = Progress::new(job.estimated_chunks);
        job.error = None;
        job.summary = None;

        let cancel = CancelSignal::new();
        *active = Some(ActiveRun {
            job_id: id,
            cancel: cancel.clone(),
        });

        Ok(RunTicket {
            job_id: id,
            text: job.text.clone(),
            estimated_chunks: job.estimated_chunks,
            cancel,
        })
    }

    pub fn update_progress(&self, id: Uuid, progress: Progress) {
        if let Some(job) = self.jobs.write().by_id.get_mut(&id) {
            job.progress = progress;
        }
    }

    /// Record the outcome of a run and release the run slot.
    pub fn finish(&self, id: Uuid, outcome: &Result<RunSummary>) {
        let mut active = self.active.lock();
        let mut jobs = self.jobs.write();

        if let Some(job) = jobs.by_id.get_mut(&id) {
            match outcome {
                Ok(summary) => {
                    job.status = JobStatus::Completed;
                    job.summary = Some(summary.clone());
                    *self.published.lock() = Some(PublishedRun {
                        job_id: id,
                        sources: job.sources.clone(),
                    });
                }
                Err(AppError::Cancelled(msg)) => {
                    job.status = JobStatus::Cancelled;
                    job.error = Some(msg.clone());
                }
                Err(e) => {
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                }
            }
        }

        if active.as_ref().is_some_and(|run| run.job_id == id) {
            *active = None;
        }
    }

    /// Ask the running job to stop.
    pub fn cancel(&self, id: Uuid) -> Result<()> {
        {
            let active = self.active.lock();
            if let Some(run) = active.as_ref().filter(|run| run.job_id == id) {
                run.cancel.cancel();
                info!(job_id = %id, "Cancellation requested");
                return Ok(());
            }
        }

        let job = self.get(id)?;
        Err(AppError::Conflict(format!(
            "Job '{}' is not running (status: {:?})",
            id, job.status
        )))
    }
}

/// Execute a started job to completion and record the outcome.
pub async fn drive(registry: Arc<JobRegistry>, pipeline: Arc<EditorPipeline>, ticket: RunTicket) {
    let job_id = ticket.job_id;
    let request = RunRequest {
        job_id,
        text: &ticket.text,
        estimated_chunks: ticket.estimated_chunks,
    };

    let progress_registry = registry.clone();
    let outcome = pipeline
        .run(request, &ticket.cancel, move |progress| {
            progress_registry.update_progress(job_id, progress)
        })
        .await;

    if let Err(e) = &outcome {
        error!(job_id = %job_id, error = %e, "Edit run failed");
    }

    registry.finish(job_id, &outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_job() -> (JobRegistry, Uuid) {
        let registry = JobRegistry::new();
        let job = registry
            .submit("Some text".to_string(), vec![], 1)
            .unwrap();
        (registry, job.id)
    }

    #[test]
    fn test_submit_rejects_blank_text() {
        let registry = JobRegistry::new();
        let err = registry.submit("  \n\t".to_string(), vec![], 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("blank")));

        let err = registry
            .submit(String::new(), vec!["a.txt".to_string()], 1)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("no text")));
    }

    #[test]
    fn test_submissions_do_not_overwrite_each_other() {
        let registry = JobRegistry::new();
        let first = registry.submit("first".to_string(), vec![], 1).unwrap();
        let second = registry.submit("second".to_string(), vec![], 1).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(&*registry.get(first.id).unwrap().text, "first");
        assert_eq!(&*registry.get(second.id).unwrap().text, "second");
    }

    #[test]
    fn test_only_one_run_at_a_time() {
        let registry = JobRegistry::new();
        let a = registry.submit("a".to_string(), vec![], 1).unwrap().id;
        let b = registry.submit("b".to_string(), vec![], 1).unwrap().id;

        let ticket = registry.start(a).unwrap();
        assert_eq!(registry.active_job(), Some(a));
        assert_eq!(registry.get(a).unwrap().status, JobStatus::Running);

        assert!(matches!(registry.start(b), Err(AppError::Conflict(_))));
        assert!(matches!(registry.start(a), Err(AppError::Conflict(_))));

        registry.finish(ticket.job_id, &Err(AppError::ServiceError("boom".to_string())));
        assert_eq!(registry.active_job(), None);
        assert_eq!(registry.get(a).unwrap().status, JobStatus::Failed);

        registry.start(b).unwrap();
        assert_eq!(registry.active_job(), Some(b));
    }

    #[test]
    fn test_start_unknown_job() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.start(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(registry.active_job(), None);
    }

    #[test]
    fn test_cancel_signals_running_job() {
        let (registry, id) = registry_with_job();
        let ticket = registry.start(id).unwrap();

        registry.cancel(id).unwrap();
        assert!(ticket.cancel.is_cancelled());

        registry.finish(id, &Err(AppError::Cancelled("stopped".to_string())));
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Cancelled);
    }

    #[test]
    fn test_cancel_idle_job_is_conflict() {
        let (registry, id) = registry_with_job();
        assert!(matches!(registry.cancel(id), Err(AppError::Conflict(_))));
        assert!(matches!(
            registry.cancel(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_completed_job_can_run_again() {
        let (registry, id) = registry_with_job();
        registry.start(id).unwrap();
        registry.update_progress(
            id,
            Progress {
                completed: 1,
                estimated_total: 1,
                actual_total: Some(1),
            },
        );
        assert_eq!(registry.get(id).unwrap().progress.completed, 1);

        let summary = RunSummary {
            job_id: id,
            chunks: 1,
            characters_in: 9,
            characters_out: 11,
            duration_ms: 5,
            artifact: "text_files/edited.txt".into(),
        };
        registry.finish(id, &Ok(summary.clone()));

        let job = registry.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.summary, Some(summary));

        registry.start(id).unwrap();
        let job = registry.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress.completed, 0);
        assert!(job.summary.is_none());
    }

    fn summary_for(id: Uuid) -> RunSummary {
        RunSummary {
            job_id: id,
            chunks: 1,
            characters_in: 1,
            characters_out: 3,
            duration_ms: 1,
            artifact: "text_files/edited.txt".into(),
        }
    }

    #[test]
    fn test_oldest_idle_jobs_are_forgotten() {
        let registry = JobRegistry::with_retention(2);
        let first = registry.submit("one".to_string(), vec![], 1).unwrap().id;
        let second = registry.submit("two".to_string(), vec![], 1).unwrap().id;
        let third = registry.submit("three".to_string(), vec![], 1).unwrap().id;

        assert!(matches!(registry.get(first), Err(AppError::NotFound(_))));
        assert!(registry.get(second).is_ok());
        assert!(registry.get(third).is_ok());
    }

    #[test]
    fn test_running_job_is_never_forgotten() {
        let registry = JobRegistry::with_retention(1);
        let running = registry.submit("long".to_string(), vec![], 1).unwrap().id;
        registry.start(running).unwrap();

        // Nothing idle to forget yet, so the bound is exceeded for now
        let waiting = registry.submit("next".to_string(), vec![], 1).unwrap().id;
        assert!(registry.get(waiting).is_ok());
        assert_eq!(registry.get(running).unwrap().status, JobStatus::Running);

        // Over the bound again: the idle waiting job goes, not the runner
        let newest = registry.submit("newest".to_string(), vec![], 1).unwrap().id;
        assert!(registry.get(waiting).is_err());
        assert!(registry.get(running).is_ok());
        assert!(registry.get(newest).is_ok());

        registry.finish(running, &Ok(summary_for(running)));
        let after = registry.submit("after".to_string(), vec![], 1).unwrap().id;
        assert!(registry.get(running).is_err());
        assert!(registry.get(newest).is_err());
        assert!(registry.get(after).is_ok());
    }

    #[test]
    fn test_last_published_follows_successful_runs() {
        let registry = JobRegistry::new();
        assert_eq!(registry.last_published(), None);

        let report = registry
            .submit("x".to_string(), vec!["report.docx".to_string()], 1)
            .unwrap()
            .id;
        registry.start(report).unwrap();
        registry.finish(report, &Ok(summary_for(report)));

        let published = registry.last_published().unwrap();
        assert_eq!(published.job_id, report);
        assert_eq!(published.sources, vec!["report.docx"]);

        // A failed re-run leaves the earlier artifact, and its name, in place
        registry.start(report).unwrap();
        registry.finish(report, &Err(AppError::ServiceError("down".to_string())));
        assert_eq!(registry.last_published().unwrap().job_id, report);

        let pasted = registry.submit("y".to_string(), vec![], 1).unwrap().id;
        registry.start(pasted).unwrap();
        registry.finish(pasted, &Ok(summary_for(pasted)));
        assert!(registry.last_published().unwrap().sources.is_empty());
    }

    #[test]
    fn test_response_wait_estimate() {
        let registry = JobRegistry::new();
        let job = registry
            .submit("x".to_string(), vec!["a.txt".to_string()], 3)
            .unwrap();
        let response = job.to_response(15);
        assert_eq!(response.estimated_wait_secs, 45);
        assert_eq!(response.status, JobStatus::Pending);
        assert_eq!(response.sources, vec!["a.txt"]);
        assert_eq!(response.characters, 1);
    }
}
