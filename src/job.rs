//! Download job records, lifecycle state machine, and the owning registry.
//!
//! The registry is the single owner of all job records. Other components
//! borrow a record for the duration of one operation: the aggregator folds
//! events in through `update` (one write-lock critical section per event,
//! so readers never see a half-applied transition) and the projector reads
//! a cloned snapshot through `get`. Records are never deleted; job state is
//! ephemeral and lives only as long as the process.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of a job. `InProgress` is initial; the other three are
/// terminal and no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
    PartiallyCompleted,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::PartiallyCompleted => "partially_completed",
        }
    }
}

/// One entry in a job's append-only error log.
#[derive(Debug, Clone, Serialize)]
pub struct JobError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Resolved target plus pack set for a new job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub host: String,
    pub port: u16,
    pub channel: String,
    pub bot: String,
    pub requested_packs: BTreeSet<u32>,
}

/// The central entity: one user-initiated request to download a set of
/// packs from one bot.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub channel: String,
    pub bot: String,
    /// Immutable after creation.
    pub requested_packs: BTreeSet<u32>,
    /// Grows monotonically; always a subset of `requested_packs` and
    /// disjoint from `failed_packs`.
    pub completed_packs: BTreeSet<u32>,
    pub failed_packs: BTreeSet<u32>,
    pub errors: Vec<JobError>,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    /// Set once `status` leaves `InProgress`.
    pub end_time: Option<DateTime<Utc>>,
}

impl DownloadJob {
    fn new(id: String, spec: JobSpec) -> Self {
        Self {
            id,
            host: spec.host,
            port: spec.port,
            channel: spec.channel,
            bot: spec.bot,
            requested_packs: spec.requested_packs,
            completed_packs: BTreeSet::new(),
            failed_packs: BTreeSet::new(),
            errors: Vec::new(),
            status: JobStatus::InProgress,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Records newly completed packs from the bot's cumulative session list,
    /// intersected with this job's requested set. Transitions to `Completed`
    /// when every requested pack is done. No-op once terminal.
    pub(crate) fn fold_completed(&mut self, session_completed: &[u32]) {
        if self.status.is_terminal() {
            tracing::debug!(job_id = %self.id, "ignoring completion event for terminal job");
            return;
        }
        for pack in session_completed {
            if self.requested_packs.contains(pack) && !self.failed_packs.contains(pack) {
                self.completed_packs.insert(*pack);
            }
        }
        if self.completed_packs.len() == self.requested_packs.len() {
            self.status = JobStatus::Completed;
            self.end_time = Some(Utc::now());
            tracing::info!(job_id = %self.id, packs = self.completed_packs.len(), "job completed");
        }
    }

    /// Records a pack failure and terminates the job immediately. The
    /// terminal status is `PartiallyCompleted` when some packs already
    /// completed, `Failed` otherwise. No-op once terminal.
    pub(crate) fn fold_failed(&mut self, message: String, pack: Option<u32>, trace: Option<String>) {
        if self.status.is_terminal() {
            tracing::debug!(job_id = %self.id, "ignoring failure event for terminal job");
            return;
        }
        self.errors.push(JobError { message, trace });
        if let Some(pack) = pack {
            if self.requested_packs.contains(&pack) && !self.completed_packs.contains(&pack) {
                self.failed_packs.insert(pack);
            }
        }
        self.status = if self.completed_packs.is_empty() {
            JobStatus::Failed
        } else {
            JobStatus::PartiallyCompleted
        };
        self.end_time = Some(Utc::now());
        tracing::warn!(
            job_id = %self.id,
            status = self.status.as_str(),
            completed = self.completed_packs.len(),
            requested = self.requested_packs.len(),
            "job terminated on pack failure"
        );
    }
}

/// Summary view of one job, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub status: JobStatus,
    pub completed: usize,
    pub requested: usize,
}

/// Owner of all job records. Injectable; hold it behind an `Arc` and pass
/// it to the components that need it rather than going through a global.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, DownloadJob>>,
    next_id: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id and stores a new `InProgress` record.
    /// Ids are never reused within a process.
    pub fn create(&self, spec: JobSpec) -> DownloadJob {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("job-{n}");
        let job = DownloadJob::new(id.clone(), spec);
        self.jobs.write().unwrap().insert(id, job.clone());
        job
    }

    /// Point-in-time snapshot of a job (cloned under the read lock, so the
    /// caller never observes a half-applied transition).
    pub fn get(&self, id: &str) -> Option<DownloadJob> {
        self.jobs.read().unwrap().get(id).cloned()
    }

    /// Summary of all jobs, ordered by id.
    pub fn list(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read().unwrap();
        let mut summaries: Vec<JobSummary> = jobs
            .values()
            .map(|j| JobSummary {
                id: j.id.clone(),
                status: j.status,
                completed: j.completed_packs.len(),
                requested: j.requested_packs.len(),
            })
            .collect();
        // Ids are "job-<n>", so length-then-lexicographic is numeric order.
        summaries.sort_by(|a, b| (a.id.len(), &a.id).cmp(&(b.id.len(), &b.id)));
        summaries
    }

    /// Applies one mutation as a single atomic step. Crate-internal: all
    /// state-change policy lives in the aggregator and initiator, and there
    /// is deliberately no public "set status" operation.
    pub(crate) fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut DownloadJob),
    {
        match self.jobs.write().unwrap().get_mut(id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }
}
