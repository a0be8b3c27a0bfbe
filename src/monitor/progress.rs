//! Progress event types and callback interface.
//!
//! Defines the events the measurement runner emits toward the UI, the
//! callback trait that carries them, and the cosmetic progress animation.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::errors::ErrorKind;
use crate::monitor::state::ServerInfo;

/// Phases of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    /// No run has been started yet
    Idle,
    /// Opening a measurement session
    Connecting,
    /// Measuring download throughput
    Download,
    /// Measuring upload throughput
    Upload,
    /// The last run finished successfully
    Complete,
    /// The last run was abandoned after an error
    Failed,
}

impl TestPhase {
    /// Whether a run is in flight in this phase.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            TestPhase::Connecting | TestPhase::Download | TestPhase::Upload
        )
    }
}

/// How the progress bar advances during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProgressStyle {
    /// Sweep the bar linearly over a fixed duration after each phase
    Animated,
    /// Jump straight to 50% / 100% when each phase completes
    Stepped,
}

/// Events emitted by the runner during a measurement run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Run moved into a new phase
    PhaseChange(TestPhase),
    /// A measurement session was opened
    SessionOpened(ServerInfo),
    /// New speed values in Mbps; `None` leaves a field untouched
    Speeds {
        download_mbps: Option<f64>,
        upload_mbps: Option<f64>,
    },
    /// Progress bar position in percent
    Progress(f64),
    /// The run was abandoned
    Failed {
        kind: ErrorKind,
        message: String,
        suggestion: Option<String>,
    },
    /// The run is over, successful or not. Always the last event.
    Finished,
}

/// Callback interface for progress updates.
///
/// Implementations must be non-blocking; the runner calls them between
/// measurement steps.
pub trait ProgressCallback: Send + Sync {
    /// Called when a progress event occurs.
    fn on_progress(&self, event: ProgressEvent);
}

impl ProgressCallback for UnboundedSender<ProgressEvent> {
    fn on_progress(&self, event: ProgressEvent) {
        // The receiver only goes away when the UI is shutting down.
        let _ = self.send(event);
    }
}

/// Values the progress bar takes when animating from `start` to `end` in
/// `steps` equal increments.
///
/// The starting value itself is not included (it is already on screen) and
/// the final value is exactly `end`. Zero steps jumps straight to `end`.
/// Values are produced lazily, one per step.
pub fn animation_values(
    start: f64,
    end: f64,
    steps: u32,
) -> impl Iterator<Item = f64> {
    let steps = steps.max(1);
    let increment = (end - start) / steps as f64;

    (1..=steps).map(move |step| {
        if step == steps {
            end
        } else {
            start + increment * step as f64
        }
    })
}
