//! Scripted in-process stand-in for the external IRC/XDCC capability.
//!
//! Records connects, joins, and started transfers, and hands the test the
//! event sender of each transfer so the test plays the bot's side.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use xdm::client::{IrcIdentity, TransferEvent, TransferHandle, XdccConnection, XdccConnector};
use xdm::XdmError;

/// One transfer the orchestrator started against the fake.
#[derive(Clone)]
pub struct StartedTransfer {
    pub bot: String,
    pub packs: Vec<u32>,
    pub events: mpsc::Sender<TransferEvent>,
}

#[derive(Default)]
pub struct FakeXdcc {
    connects: AtomicUsize,
    joins: Mutex<Vec<String>>,
    transfers: Mutex<Vec<StartedTransfer>>,
}

impl FakeXdcc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub async fn joined_channels(&self) -> Vec<String> {
        self.joins.lock().await.clone()
    }

    /// Waits for the orchestrator's fire-and-forget start to reach the fake.
    pub async fn wait_for_transfer(&self, index: usize) -> StartedTransfer {
        for _ in 0..200 {
            if let Some(t) = self.transfers.lock().await.get(index).cloned() {
                return t;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("transfer {index} was never started");
    }
}

/// Connector handle to hand to `DownloadManager::new`.
pub fn connector(fake: &Arc<FakeXdcc>) -> Arc<dyn XdccConnector> {
    Arc::new(FakeConnector(Arc::clone(fake)))
}

struct FakeConnector(Arc<FakeXdcc>);

#[async_trait]
impl XdccConnector for FakeConnector {
    async fn connect(
        &self,
        _host: &str,
        _port: u16,
        _identity: &IrcIdentity,
        download_dir: &Path,
    ) -> Result<Arc<dyn XdccConnection>, XdmError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeConnection {
            fake: Arc::clone(&self.0),
            dir: download_dir.to_path_buf(),
        }))
    }
}

struct FakeConnection {
    fake: Arc<FakeXdcc>,
    dir: PathBuf,
}

#[async_trait]
impl XdccConnection for FakeConnection {
    async fn join_channel(&self, channel: &str) -> Result<(), XdmError> {
        self.fake.joins.lock().await.push(channel.to_string());
        Ok(())
    }

    async fn start_transfer(&self, bot: &str, packs: &[u32]) -> Result<TransferHandle, XdmError> {
        let (tx, handle) = TransferHandle::channel(16);
        self.fake.transfers.lock().await.push(StartedTransfer {
            bot: bot.to_string(),
            packs: packs.to_vec(),
            events: tx,
        });
        Ok(handle)
    }

    fn download_dir(&self) -> &Path {
        &self.dir
    }
}
