pub mod config;
pub mod logging;

// Core modules
pub mod aggregator;
pub mod client;
pub mod error;
pub mod job;
pub mod manager;
pub mod packs;
pub mod pool;
pub mod status;

pub use error::XdmError;
pub use manager::{DownloadManager, DownloadRequest, InitiateResponse};
pub use status::StatusSnapshot;
