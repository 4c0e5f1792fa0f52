//! Top-level entry points: initiate a download job, poll its status.
//!
//! `initiate_download` is fire-and-forget: it validates the request,
//! registers the job, acquires the pooled connection and joins the channel
//! synchronously, then schedules the transfer start and returns. The
//! returned `in_progress` response can be stale relative to true status;
//! callers poll `download_status`.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregator;
use crate::client::XdccConnector;
use crate::config::XdmConfig;
use crate::error::XdmError;
use crate::job::{JobRegistry, JobSpec, JobStatus, JobSummary};
use crate::packs::expand_pack_ranges;
use crate::pool::ConnectionPool;
use crate::status::{self, StatusSnapshot};

/// One download request. `host`, `channel`, `bot`, and `packs` are
/// required; the rest fall back to configured defaults.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub host: String,
    pub port: Option<u16>,
    pub channel: String,
    pub bot: String,
    /// Pack expression, e.g. `"1-3,5"`.
    pub packs: String,
    pub download_path: Option<PathBuf>,
    pub nickname: Option<String>,
}

/// Synchronous reply to `initiate_download`.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateResponse {
    pub job_id: String,
    pub message: String,
    pub status: JobStatus,
}

/// Orchestrator owning the job registry and connection pool.
///
/// Hold one behind an `Arc` for the process lifetime; jobs and connections
/// are in-memory only and do not survive a restart.
pub struct DownloadManager {
    config: XdmConfig,
    registry: Arc<JobRegistry>,
    pool: ConnectionPool,
}

impl DownloadManager {
    pub fn new(config: XdmConfig, connector: Arc<dyn XdccConnector>) -> Self {
        Self {
            config,
            registry: Arc::new(JobRegistry::new()),
            pool: ConnectionPool::new(connector),
        }
    }

    /// Starts a download job and returns before the transfer completes.
    ///
    /// Fails with `XdmError::Validation` for empty required fields or a pack
    /// expression with no valid numbers, and `XdmError::Connection` when the
    /// capability cannot connect or join during this synchronous phase. A
    /// failure of the scheduled transfer start itself is folded into the job
    /// record after this call has already returned.
    pub async fn initiate_download(
        &self,
        request: DownloadRequest,
    ) -> Result<InitiateResponse, XdmError> {
        let host = required("host", &request.host)?;
        let channel = required("channel", &request.channel)?;
        let bot = required("bot", &request.bot)?;
        let port = request.port.unwrap_or(self.config.default_port);
        let nickname = request
            .nickname
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.config.default_nickname)
            .to_string();
        let download_dir = request
            .download_path
            .unwrap_or_else(|| self.config.download_dir.clone());

        let requested_packs = expand_pack_ranges(&request.packs)?;
        let pack_count = requested_packs.len();

        let job = self.registry.create(JobSpec {
            host: host.clone(),
            port,
            channel: channel.clone(),
            bot: bot.clone(),
            requested_packs,
        });
        tracing::info!(
            job_id = %job.id,
            %host, port, %channel, %bot, packs = pack_count,
            "created download job"
        );

        let connection = match self.pool.acquire(&host, port, &nickname, &download_dir).await {
            Ok(connection) => connection,
            Err(e) => {
                self.fail_job(&job.id, &e);
                return Err(e);
            }
        };
        if let Err(e) = connection.join_channel(&channel).await {
            self.fail_job(&job.id, &e);
            return Err(e);
        }

        // Schedule the transfer start; from here on errors belong to the
        // job record, not to this caller.
        let registry = Arc::clone(&self.registry);
        let job_id = job.id.clone();
        let task_bot = bot.clone();
        let packs: Vec<u32> = job.requested_packs.iter().copied().collect();
        tokio::spawn(async move {
            match connection.start_transfer(&task_bot, &packs).await {
                Ok(handle) => {
                    aggregator::spawn_event_loop(registry, job_id, handle);
                }
                Err(e) => {
                    tracing::warn!(%job_id, error = %e, "transfer start rejected");
                    registry.update(&job_id, |j| {
                        j.fold_failed(e.to_string(), None, Some(format!("{e:?}")))
                    });
                }
            }
        });

        Ok(InitiateResponse {
            job_id: job.id.clone(),
            message: format!(
                "Download job {} started: {pack_count} pack(s) from {bot} on {host}:{port}",
                job.id
            ),
            status: JobStatus::InProgress,
        })
    }

    /// Point-in-time status of a job. Never fails; an unknown id is
    /// reported as a `failed` snapshot.
    pub fn download_status(&self, job_id: &str) -> StatusSnapshot {
        status::project(&self.registry, job_id)
    }

    /// Summary of all jobs created by this manager.
    pub fn list_jobs(&self) -> Vec<JobSummary> {
        self.registry.list()
    }

    /// Number of live pooled connections (observability hook).
    pub async fn pool_size(&self) -> usize {
        self.pool.size().await
    }

    fn fail_job(&self, job_id: &str, error: &XdmError) {
        self.registry.update(job_id, |j| {
            j.fold_failed(error.to_string(), None, None)
        });
    }
}

fn required(field: &str, value: &str) -> Result<String, XdmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(XdmError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
