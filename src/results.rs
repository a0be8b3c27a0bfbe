//! Summary of a single measurement run.
//!
//! Built from the final [`MonitorState`] of a headless run and printed as
//! JSON with `--json`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::exit_codes;
use crate::monitor::state::{ErrorInfo, MonitorState, ServerInfo};
use crate::monitor::TestPhase;

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run ended
    pub timestamp: DateTime<Utc>,
    /// `complete` or `failed`
    pub status: TestPhase,
    /// Server the run measured against, if a session was opened
    pub server: Option<ServerInfo>,
    /// Download speed in Mbps, if that phase completed
    pub download_mbps: Option<f64>,
    /// Upload speed in Mbps, if that phase completed
    pub upload_mbps: Option<f64>,
    /// Why the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl RunSummary {
    /// Capture the outcome shown by a finished state.
    pub fn from_state(state: &MonitorState) -> Self {
        let status = if state.error.is_some() {
            TestPhase::Failed
        } else {
            state.phase
        };

        Self {
            timestamp: Utc::now(),
            status,
            server: state.server.clone(),
            download_mbps: state.download_mbps,
            upload_mbps: state.upload_mbps,
            error: state.error.clone(),
        }
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self.error {
            Some(ref error) => error.kind.exit_code(),
            None => exit_codes::SUCCESS,
        }
    }
}
