//! Error taxonomy for the orchestration core.
//!
//! Errors raised before a job record exists are returned to the caller of
//! `initiate`; errors raised after a job exists are folded into that job's
//! error log and reflected in its status, never thrown past the async
//! boundary (there is no caller left to throw to).

use thiserror::Error;

/// Errors surfaced synchronously by the orchestration core.
#[derive(Debug, Error)]
pub enum XdmError {
    /// Malformed request input, e.g. a pack expression that expands to
    /// nothing after dropping invalid tokens.
    #[error("validation: {0}")]
    Validation(String),

    /// The external IRC/XDCC capability failed to establish or reuse a
    /// connection during the synchronous phase of `initiate`.
    #[error("connection: {0}")]
    Connection(String),

    /// The external capability rejected a transfer request. Only seen by
    /// the aggregator; always captured into the job record.
    #[error("transfer: {0}")]
    Transfer(String),
}

impl XdmError {
    pub fn validation(msg: impl Into<String>) -> Self {
        XdmError::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        XdmError::Connection(msg.into())
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        XdmError::Transfer(msg.into())
    }
}
