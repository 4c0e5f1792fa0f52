//! Status projection: a point-in-time, read-only view of one job.
//!
//! Projection never mutates state. An unknown job id is itself a valid
//! answer to "what is the status", so it is reported as a `failed` snapshot
//! rather than an error.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job::{JobError, JobRegistry, JobStatus};

/// Snapshot of one job for callers polling for completion.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
    /// `round(100 * completed / requested)`.
    pub progress_percent: u32,
    /// Compact progress string, e.g. `"50% (2/4)"`.
    pub progress: String,
    pub requested_packs: Vec<u32>,
    pub completed_packs: Vec<u32>,
    pub failed_packs: Vec<u32>,
    pub errors: Vec<JobError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Present only once the job has left `in_progress`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Projects the current state of `id`. Unknown ids yield a `failed`
/// snapshot naming the id, with empty progress fields.
pub fn project(registry: &JobRegistry, id: &str) -> StatusSnapshot {
    let Some(job) = registry.get(id) else {
        return StatusSnapshot {
            job_id: id.to_string(),
            status: JobStatus::Failed,
            message: format!("no download job found with id {id:?}"),
            progress_percent: 0,
            progress: String::new(),
            requested_packs: Vec::new(),
            completed_packs: Vec::new(),
            failed_packs: Vec::new(),
            errors: Vec::new(),
            start_time: None,
            end_time: None,
        };
    };

    let requested = job.requested_packs.len();
    let completed = job.completed_packs.len();
    let progress_percent = if requested == 0 {
        0
    } else {
        (100.0 * completed as f64 / requested as f64).round() as u32
    };
    let progress = format!("{progress_percent}% ({completed}/{requested})");

    let message = match job.status {
        JobStatus::InProgress => format!("Downloading: {progress}"),
        JobStatus::Completed => format!("All packs downloaded: {progress}"),
        JobStatus::Failed => format!("Download failed: {progress}"),
        JobStatus::PartiallyCompleted => {
            format!("Download partially completed: {progress}")
        }
    };

    StatusSnapshot {
        job_id: job.id,
        status: job.status,
        message,
        progress_percent,
        progress,
        requested_packs: job.requested_packs.iter().copied().collect(),
        completed_packs: job.completed_packs.iter().copied().collect(),
        failed_packs: job.failed_packs.iter().copied().collect(),
        errors: job.errors,
        start_time: Some(job.start_time),
        end_time: job.end_time,
    }
}
