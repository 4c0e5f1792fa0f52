//! Connection pool: one live IRC connection per `host:port` key.
//!
//! Connections are created lazily on first acquire and reused for the
//! process lifetime; there is no eviction and no explicit close. A later
//! acquire for the same key with a different nickname or download path
//! reuses the existing connection unchanged (first-writer-wins).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::{IrcIdentity, XdccConnection, XdccConnector};
use crate::error::XdmError;

struct PoolEntry {
    connection: Arc<dyn XdccConnection>,
    download_dir: PathBuf,
}

/// Pool of reusable IRC endpoint connections, keyed by `host:port`.
pub struct ConnectionPool {
    connector: Arc<dyn XdccConnector>,
    // Async mutex held across connect() so two near-simultaneous acquires
    // for the same key cannot race into two competing connections.
    entries: Mutex<HashMap<String, PoolEntry>>,
}

/// Pool key for an endpoint.
pub fn pool_key(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

impl ConnectionPool {
    pub fn new(connector: Arc<dyn XdccConnector>) -> Self {
        Self {
            connector,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pooled connection for `host:port`, connecting first if
    /// none exists. On first acquisition the download directory is created
    /// (recursively, idempotent) before connecting. Nickname and download
    /// path are only honored for the connection that is actually created.
    pub async fn acquire(
        &self,
        host: &str,
        port: u16,
        nickname: &str,
        download_dir: &Path,
    ) -> Result<Arc<dyn XdccConnection>, XdmError> {
        let key = pool_key(host, port);
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            tracing::debug!(%key, dir = %entry.download_dir.display(), "reusing pooled connection");
            return Ok(Arc::clone(&entry.connection));
        }

        tokio::fs::create_dir_all(download_dir)
            .await
            .map_err(|e| {
                XdmError::connection(format!(
                    "cannot create download directory {}: {e}",
                    download_dir.display()
                ))
            })?;

        let identity = IrcIdentity {
            nickname: nickname.to_string(),
        };
        let connection = self
            .connector
            .connect(host, port, &identity, download_dir)
            .await?;
        tracing::info!(%key, nickname, dir = %download_dir.display(), "opened new IRC connection");

        entries.insert(
            key,
            PoolEntry {
                connection: Arc::clone(&connection),
                download_dir: download_dir.to_path_buf(),
            },
        );
        Ok(connection)
    }

    /// Number of live pooled connections.
    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }
}
