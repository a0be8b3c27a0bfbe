//! Measurement runner.
//!
//! Runs one download/upload cycle against a [`SpeedBackend`] on a worker
//! task and reports everything through a [`ProgressCallback`]. It never
//! touches UI state directly.

use std::time::Duration;

use log::{error, info};
use tokio::time::sleep;

use super::progress::{
    animation_values, ProgressCallback, ProgressEvent, ProgressStyle, TestPhase,
};
use crate::backend::{MeasurementSession, SpeedBackend};
use crate::errors::MeasurementError;
use crate::measurements::bps_to_mbps;

/// Default nominal duration of one phase's progress animation.
pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_secs(15);

/// Default number of steps in one phase's progress animation.
pub const DEFAULT_ANIMATION_STEPS: u32 = 100;

/// Upper bound accepted for the number of animation steps.
pub const MAX_ANIMATION_STEPS: u32 = 10_000;

/// Progress bar position once the download phase is done.
const DOWNLOAD_DONE_PERCENT: f64 = 50.0;

/// Progress bar position once the upload phase is done.
const UPLOAD_DONE_PERCENT: f64 = 100.0;

/// Configuration for the runner's progress reporting.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// How the progress bar advances
    pub style: ProgressStyle,
    /// Nominal duration of each phase's animation
    pub animation_duration: Duration,
    /// Steps in each phase's animation
    pub animation_steps: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            style: ProgressStyle::Animated,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            animation_steps: DEFAULT_ANIMATION_STEPS,
        }
    }
}

/// Drives a single measurement run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run one measurement cycle.
    ///
    /// Failures end the run early: they are logged, reported as a
    /// [`ProgressEvent::Failed`], and leave any speed already reported in
    /// place. [`ProgressEvent::Finished`] is always the last event sent.
    pub async fn run<B: SpeedBackend>(
        &self,
        backend: &B,
        progress: &dyn ProgressCallback,
    ) {
        info!("Starting measurement run");

        match self.measure(backend, progress).await {
            Ok(()) => info!("Measurement run complete"),
            Err(e) => {
                error!("Error during speed test ({:?} phase): {}", e.phase, e);
                progress.on_progress(ProgressEvent::Failed {
                    kind: e.kind,
                    message: e.message.clone(),
                    suggestion: e.suggestion.clone(),
                });
            }
        }

        progress.on_progress(ProgressEvent::Finished);
    }

    async fn measure<B: SpeedBackend>(
        &self,
        backend: &B,
        progress: &dyn ProgressCallback,
    ) -> Result<(), MeasurementError> {
        progress.on_progress(ProgressEvent::PhaseChange(TestPhase::Connecting));
        let mut session = backend.open_session().await?;
        if let Some(server) = session.server() {
            progress.on_progress(ProgressEvent::SessionOpened(server));
        }

        progress.on_progress(ProgressEvent::PhaseChange(TestPhase::Download));
        let download_mbps = bps_to_mbps(session.download().await?);
        progress.on_progress(ProgressEvent::Speeds {
            download_mbps: Some(download_mbps),
            upload_mbps: None,
        });
        self.advance(progress, 0.0, DOWNLOAD_DONE_PERCENT).await;

        progress.on_progress(ProgressEvent::PhaseChange(TestPhase::Upload));
        let upload_mbps = bps_to_mbps(session.upload().await?);
        progress.on_progress(ProgressEvent::Speeds {
            download_mbps: None,
            upload_mbps: Some(upload_mbps),
        });
        self.advance(progress, DOWNLOAD_DONE_PERCENT, UPLOAD_DONE_PERCENT)
            .await;

        Ok(())
    }

    /// Move the progress bar from `start` to `end` according to the
    /// configured style.
    async fn advance(
        &self,
        progress: &dyn ProgressCallback,
        start: f64,
        end: f64,
    ) {
        match self.config.style {
            ProgressStyle::Stepped => {
                progress.on_progress(ProgressEvent::Progress(end));
            }
            ProgressStyle::Animated => {
                let steps = self.config.animation_steps;
                let delay = self.config.animation_duration / steps.max(1);

                for value in animation_values(start, end, steps) {
                    progress.on_progress(ProgressEvent::Progress(value));
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }
    }
}
