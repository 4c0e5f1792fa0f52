//! Seam to the external IRC/XDCC transfer capability.
//!
//! The wire protocol and XDCC handshake are not implemented here. The core
//! consumes the capability through these traits: a connector opens
//! connections, a connection joins channels and starts transfers, and a
//! started transfer reports lifecycle events over a channel. Tests drive the
//! orchestrator with scripted implementations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::XdmError;

/// Identity used when registering with an IRC server.
#[derive(Debug, Clone)]
pub struct IrcIdentity {
    pub nickname: String,
}

/// Lifecycle events emitted by a running transfer.
///
/// Ordering between independently scheduled events is not guaranteed; the
/// aggregator must tolerate, for example, a failure for pack 3 arriving
/// before the completion of pack 2.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// Periodic, informational only. Never mutates job state.
    Progress {
        pack: u32,
        bytes_received: u64,
        percent: f64,
        eta_secs: Option<u64>,
    },
    /// One requested pack finished. Carries the bot's self-reported list of
    /// all packs completed so far on this connection (cumulative for the
    /// session, so it may include packs from other jobs).
    PackCompleted { session_completed: Vec<u32> },
    /// A pack failed. `pack` is present when the capability can attribute
    /// the failure; `file` is the remote file name when known.
    PackFailed {
        message: String,
        pack: Option<u32>,
        file: Option<String>,
    },
}

/// Receiving side of a started transfer's event stream.
#[derive(Debug)]
pub struct TransferHandle {
    pub events: mpsc::Receiver<TransferEvent>,
}

impl TransferHandle {
    /// Builds a handle plus the sender the capability uses to publish events.
    pub fn channel(buffer: usize) -> (mpsc::Sender<TransferEvent>, TransferHandle) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, TransferHandle { events: rx })
    }
}

/// One live connection to an IRC endpoint.
#[async_trait]
pub trait XdccConnection: Send + Sync {
    /// Requests a channel join. Idempotent at the protocol level; duplicate
    /// joins are the server's concern, not ours.
    async fn join_channel(&self, channel: &str) -> Result<(), XdmError>;

    /// Asks `bot` for the given packs and returns the event stream for the
    /// transfer. Rejection here surfaces as `XdmError::Transfer`.
    async fn start_transfer(&self, bot: &str, packs: &[u32]) -> Result<TransferHandle, XdmError>;

    /// Directory this connection downloads into (fixed at connect time).
    fn download_dir(&self) -> &Path;
}

/// Factory for connections; the pool holds one of these.
#[async_trait]
pub trait XdccConnector: Send + Sync {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        identity: &IrcIdentity,
        download_dir: &Path,
    ) -> Result<Arc<dyn XdccConnection>, XdmError>;
}
