//! Backend with scripted outcomes, for exercising the runner and the UI
//! without a network.

use super::{MeasurementSession, SpeedBackend};
use crate::errors::{ErrorKind, MeasurementError};
use crate::monitor::state::ServerInfo;
use crate::monitor::TestPhase;

/// Outcome scripted for one measurement phase.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Report this many bits per second
    Ok(f64),
    /// Fail with this kind of error
    Fail(ErrorKind),
}

impl Step {
    fn into_result(self, phase: TestPhase) -> Result<f64, MeasurementError> {
        match self {
            Step::Ok(bps) => Ok(bps),
            Step::Fail(kind) => Err(MeasurementError::new(
                kind,
                phase,
                format!("{:?} failed", phase),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptedBackend {
    /// Fail session creation with this kind of error
    pub session: Option<ErrorKind>,
    pub download: Step,
    pub upload: Step,
}

impl ScriptedBackend {
    /// A backend where every phase succeeds.
    pub fn succeeding(download_bps: f64, upload_bps: f64) -> Self {
        Self {
            session: None,
            download: Step::Ok(download_bps),
            upload: Step::Ok(upload_bps),
        }
    }
}

pub struct ScriptedSession {
    download: Step,
    upload: Step,
}

impl SpeedBackend for ScriptedBackend {
    type Session = ScriptedSession;

    async fn open_session(&self) -> Result<ScriptedSession, MeasurementError> {
        match self.session {
            Some(kind) => Err(MeasurementError::new(
                kind,
                TestPhase::Connecting,
                "server discovery failed",
            )),
            None => Ok(ScriptedSession {
                download: self.download,
                upload: self.upload,
            }),
        }
    }
}

impl MeasurementSession for ScriptedSession {
    fn server(&self) -> Option<ServerInfo> {
        Some(ServerInfo {
            colo: "LHR".to_string(),
            ip: "192.0.2.10".to_string(),
            country: "GB".to_string(),
        })
    }

    async fn download(&mut self) -> Result<f64, MeasurementError> {
        self.download.into_result(TestPhase::Download)
    }

    async fn upload(&mut self) -> Result<f64, MeasurementError> {
        self.upload.into_result(TestPhase::Upload)
    }
}
