//! Progress aggregation: folds transfer events into the owning job record.
//!
//! One task per started transfer drains its event stream and applies each
//! event to the registry as a single atomic step. Progress events are
//! informational and only logged. Events arriving after the job reached a
//! terminal state are logged and discarded; a terminal job is never
//! re-opened.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::client::{TransferEvent, TransferHandle};
use crate::job::JobRegistry;

/// Spawns the event loop for one transfer. The task ends when the
/// capability drops its sender; a stalled transfer that never emits a
/// terminal event simply leaves the job `in_progress` (no timeout exists in
/// this core).
pub fn spawn_event_loop(
    registry: Arc<JobRegistry>,
    job_id: String,
    mut handle: TransferHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handle.events.recv().await {
            apply_event(&registry, &job_id, event);
        }
        tracing::debug!(%job_id, "transfer event stream closed");
    })
}

/// Folds one event into the job record.
pub fn apply_event(registry: &JobRegistry, job_id: &str, event: TransferEvent) {
    match event {
        TransferEvent::Progress {
            pack,
            bytes_received,
            percent,
            eta_secs,
        } => {
            tracing::debug!(job_id, pack, bytes_received, percent, eta_secs, "transfer progress");
        }
        TransferEvent::PackCompleted { session_completed } => {
            let known = registry.update(job_id, |job| job.fold_completed(&session_completed));
            if !known {
                tracing::warn!(job_id, "completion event for unknown job");
            }
        }
        TransferEvent::PackFailed { message, pack, file } => {
            let message = match file {
                Some(file) => format!("{message} (file: {file})"),
                None => message,
            };
            let known = registry.update(job_id, |job| job.fold_failed(message, pack, None));
            if !known {
                tracing::warn!(job_id, "failure event for unknown job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobSpec, JobStatus};

    fn registry_with_job(packs: &[u32]) -> (Arc<JobRegistry>, String) {
        let registry = Arc::new(JobRegistry::new());
        let job = registry.create(JobSpec {
            host: "irc.example.com".to_string(),
            port: 6667,
            channel: "#test".to_string(),
            bot: "bot1".to_string(),
            requested_packs: packs.iter().copied().collect(),
        });
        (registry, job.id)
    }

    #[test]
    fn progress_events_do_not_mutate_state() {
        let (registry, id) = registry_with_job(&[1, 2]);
        apply_event(
            &registry,
            &id,
            TransferEvent::Progress {
                pack: 1,
                bytes_received: 4096,
                percent: 12.5,
                eta_secs: Some(30),
            },
        );
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.completed_packs.is_empty());
        assert!(job.errors.is_empty());
    }

    #[tokio::test]
    async fn event_loop_folds_out_of_order_events() {
        let (registry, id) = registry_with_job(&[2, 3]);
        let (tx, handle) = TransferHandle::channel(8);
        let task = spawn_event_loop(Arc::clone(&registry), id.clone(), handle);

        // Failure for pack 3 is delivered before the completion of pack 2.
        tx.send(TransferEvent::PackFailed {
            message: "connection reset by bot".to_string(),
            pack: Some(3),
            file: None,
        })
        .await
        .unwrap();
        tx.send(TransferEvent::PackCompleted {
            session_completed: vec![2],
        })
        .await
        .unwrap();
        drop(tx);
        task.await.unwrap();

        let job = registry.get(&id).unwrap();
        // Job terminated on the failure; the late completion was discarded.
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.completed_packs.is_empty());
        assert_eq!(job.failed_packs, [3].into_iter().collect());
        assert_eq!(job.errors.len(), 1);
    }

    #[tokio::test]
    async fn event_loop_completes_job() {
        let (registry, id) = registry_with_job(&[1, 2]);
        let (tx, handle) = TransferHandle::channel(8);
        let task = spawn_event_loop(Arc::clone(&registry), id.clone(), handle);

        tx.send(TransferEvent::PackCompleted {
            session_completed: vec![1],
        })
        .await
        .unwrap();
        tx.send(TransferEvent::PackCompleted {
            session_completed: vec![1, 2],
        })
        .await
        .unwrap();
        drop(tx);
        task.await.unwrap();

        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_packs, [1, 2].into_iter().collect());
    }
}
