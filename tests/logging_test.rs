//! Smoke test: logging initialization creates and writes the log file
//! under the XDG state dir. Lives in its own test binary because the
//! global subscriber can only be installed once per process.

use std::path::PathBuf;

#[test]
fn init_logging_writes_to_the_state_dir() {
    let state = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_STATE_HOME", state.path());

    xdm::logging::init_logging().expect("logging init");
    tracing::info!("orchestrator smoke entry");

    let log_file: PathBuf = state.path().join("xdm").join("xdm").join("xdm.log");
    assert!(log_file.is_file(), "log file should exist at {}", log_file.display());
    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("logging initialized"));
    assert!(contents.contains("orchestrator smoke entry"));
}
