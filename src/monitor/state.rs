//! Monitor window state.
//!
//! Holds everything the renderer draws: the two speed labels, the start
//! button, the progress bar and the status line. Only the UI loop mutates
//! this; the runner talks to it through [`ProgressEvent`]s.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::progress::{ProgressEvent, TestPhase};
use crate::errors::ErrorKind;

/// Placeholder shown in place of a speed that has not been measured.
pub const SPEED_PLACEHOLDER: &str = "--";

/// Server a session is measuring against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Datacenter code
    pub colo: String,
    /// Client IP address as seen by the server
    pub ip: String,
    /// Country code
    pub country: String,
}

/// Error information for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    /// Category of the failure
    pub kind: ErrorKind,
    /// Error message
    pub message: String,
    /// Optional suggestion for resolution
    pub suggestion: Option<String>,
}

/// Label on the start button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Start,
    Testing,
    Restart,
}

impl ButtonLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonLabel::Start => "Start Test",
            ButtonLabel::Testing => "Testing...",
            ButtonLabel::Restart => "Restart Test",
        }
    }
}

/// The start button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartButton {
    pub enabled: bool,
    pub label: ButtonLabel,
}

/// State for the monitor window.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Current test phase
    pub phase: TestPhase,
    /// Last measured download speed in Mbps
    pub download_mbps: Option<f64>,
    /// Last measured upload speed in Mbps
    pub upload_mbps: Option<f64>,
    /// Progress bar position, always within [0, 100]
    pub progress: f64,
    /// Start button
    pub button: StartButton,
    /// Server of the current or last session
    pub server: Option<ServerInfo>,
    /// Failure of the last run, if it failed
    pub error: Option<ErrorInfo>,
    /// Number of runs started since launch
    pub runs_started: u32,
    /// When the last successful run finished
    pub last_completed: Option<DateTime<Local>>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            phase: TestPhase::Idle,
            download_mbps: None,
            upload_mbps: None,
            progress: 0.0,
            button: StartButton { enabled: true, label: ButtonLabel::Start },
            server: None,
            error: None,
            runs_started: 0,
            last_completed: None,
        }
    }
}

impl MonitorState {
    /// Create a new MonitorState with the initial layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the start button.
    ///
    /// While busy the button is disabled and reads "Testing...". Once idle
    /// again it reads "Start Test" before the first run and "Restart Test"
    /// afterwards.
    pub fn set_busy(&mut self, busy: bool) {
        self.button = if busy {
            StartButton { enabled: false, label: ButtonLabel::Testing }
        } else if self.runs_started == 0 {
            StartButton { enabled: true, label: ButtonLabel::Start }
        } else {
            StartButton { enabled: true, label: ButtonLabel::Restart }
        };
    }

    /// Whether a run is in progress.
    pub fn is_busy(&self) -> bool {
        !self.button.enabled
    }

    /// Move the progress bar, clamping to [0, 100].
    pub fn set_progress(&mut self, percent: f64) {
        self.progress = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
    }

    /// Update the speed labels. Fields passed as `None` are left alone.
    pub fn set_speeds(&mut self, download: Option<f64>, upload: Option<f64>) {
        if let Some(download) = download {
            self.download_mbps = Some(download);
        }
        if let Some(upload) = upload {
            self.upload_mbps = Some(upload);
        }
    }

    /// Record a failure for display. Speeds already measured are kept.
    pub fn set_error(
        &mut self,
        kind: ErrorKind,
        message: String,
        suggestion: Option<String>,
    ) {
        self.error = Some(ErrorInfo { kind, message, suggestion });
    }

    /// Reset the window for a new run and lock the start button.
    pub fn begin_run(&mut self) {
        self.runs_started += 1;
        self.set_busy(true);
        self.set_progress(0.0);
        self.download_mbps = None;
        self.upload_mbps = None;
        self.server = None;
        self.error = None;
        self.phase = TestPhase::Connecting;
    }

    /// Text of the download label.
    pub fn download_text(&self) -> String {
        format!("Download Speed: {}", format_speed(self.download_mbps))
    }

    /// Text of the upload label.
    pub fn upload_text(&self) -> String {
        format!("Upload Speed: {}", format_speed(self.upload_mbps))
    }

    /// Update state from a progress event.
    pub fn update_from_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseChange(phase) => {
                self.phase = *phase;
            }
            ProgressEvent::SessionOpened(server) => {
                self.server = Some(server.clone());
            }
            ProgressEvent::Speeds { download_mbps, upload_mbps } => {
                self.set_speeds(*download_mbps, *upload_mbps);
            }
            ProgressEvent::Progress(percent) => {
                self.set_progress(*percent);
            }
            ProgressEvent::Failed { kind, message, suggestion } => {
                self.set_error(*kind, message.clone(), suggestion.clone());
                self.phase = TestPhase::Failed;
            }
            ProgressEvent::Finished => {
                if self.phase != TestPhase::Failed {
                    self.phase = TestPhase::Complete;
                    self.last_completed = Some(Local::now());
                }
                self.set_busy(false);
            }
        }
    }
}

/// Format an optional speed with two decimals, or the placeholder.
pub fn format_speed(speed_mbps: Option<f64>) -> String {
    match speed_mbps {
        Some(speed) => format!("{:.2} Mbps", speed),
        None => format!("{} Mbps", SPEED_PLACEHOLDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_layout() {
        let state = MonitorState::new();

        assert_eq!(state.phase, TestPhase::Idle);
        assert_eq!(state.download_text(), "Download Speed: -- Mbps");
        assert_eq!(state.upload_text(), "Upload Speed: -- Mbps");
        assert!(state.button.enabled);
        assert_eq!(state.button.label.as_str(), "Start Test");
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_begin_run_disables_button_immediately() {
        let mut state = MonitorState::new();
        state.begin_run();

        assert!(state.is_busy());
        assert!(!state.button.enabled);
        assert_eq!(state.button.label, ButtonLabel::Testing);
        assert_eq!(state.phase, TestPhase::Connecting);
    }

    #[test]
    fn test_begin_run_resets_previous_results() {
        let mut state = MonitorState::new();
        state.set_speeds(Some(10.0), Some(5.0));
        state.set_progress(100.0);
        state.set_error(ErrorKind::Network, "boom".to_string(), None);

        state.begin_run();

        assert_eq!(state.download_mbps, None);
        assert_eq!(state.upload_mbps, None);
        assert_eq!(state.progress, 0.0);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_set_busy_labels() {
        let mut state = MonitorState::new();

        state.set_busy(false);
        assert_eq!(state.button.label, ButtonLabel::Start);

        state.begin_run();
        state.set_busy(false);
        assert!(state.button.enabled);
        assert_eq!(state.button.label.as_str(), "Restart Test");
    }

    #[test]
    fn test_set_speeds_updates_only_given_fields() {
        let mut state = MonitorState::new();

        state.set_speeds(Some(100.0), None);
        assert_eq!(state.download_text(), "Download Speed: 100.00 Mbps");
        assert_eq!(state.upload_text(), "Upload Speed: -- Mbps");

        state.set_speeds(None, Some(50.5));
        assert_eq!(state.download_text(), "Download Speed: 100.00 Mbps");
        assert_eq!(state.upload_text(), "Upload Speed: 50.50 Mbps");
    }

    #[test]
    fn test_set_progress_nan_is_zero() {
        let mut state = MonitorState::new();
        state.set_progress(f64::NAN);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_finished_after_success() {
        let mut state = MonitorState::new();
        state.begin_run();
        state.update_from_event(&ProgressEvent::PhaseChange(TestPhase::Upload));
        state.update_from_event(&ProgressEvent::Finished);

        assert_eq!(state.phase, TestPhase::Complete);
        assert!(state.last_completed.is_some());
        assert!(state.button.enabled);
        assert_eq!(state.button.label, ButtonLabel::Restart);
    }

    #[test]
    fn test_finished_after_failure_keeps_failed_phase() {
        let mut state = MonitorState::new();
        state.begin_run();
        state.update_from_event(&ProgressEvent::Speeds {
            download_mbps: Some(42.0),
            upload_mbps: None,
        });
        state.update_from_event(&ProgressEvent::Failed {
            kind: ErrorKind::Timeout,
            message: "upload test: timed out".to_string(),
            suggestion: None,
        });
        state.update_from_event(&ProgressEvent::Finished);

        assert_eq!(state.phase, TestPhase::Failed);
        assert!(state.last_completed.is_none());
        assert_eq!(state.download_mbps, Some(42.0));
        assert_eq!(state.upload_mbps, None);
        assert!(state.button.enabled);
        assert_eq!(state.button.label, ButtonLabel::Restart);
    }

    #[test]
    fn test_session_opened_sets_server() {
        let mut state = MonitorState::new();
        let server = ServerInfo {
            colo: "FRA".to_string(),
            ip: "198.51.100.4".to_string(),
            country: "DE".to_string(),
        };

        state.update_from_event(&ProgressEvent::SessionOpened(server.clone()));
        assert_eq!(state.server, Some(server));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Whatever is passed to the progress setter, the stored value
        /// stays within [0, 100].
        #[test]
        fn prop_progress_is_clamped(percent in proptest::num::f64::ANY) {
            let mut state = MonitorState::new();
            state.set_progress(percent);

            prop_assert!(state.progress >= 0.0 && state.progress <= 100.0);
            if (0.0..=100.0).contains(&percent) {
                prop_assert_eq!(state.progress, percent);
            }
        }

        /// Speeds are always shown with exactly two decimals.
        #[test]
        fn prop_speed_formatting_precision(speed in 0.0f64..100_000.0) {
            let formatted = format_speed(Some(speed));
            prop_assert!(formatted.ends_with(" Mbps"));

            let numeric_part = formatted.trim_end_matches(" Mbps");
            let dot_pos = numeric_part.find('.');
            prop_assert!(dot_pos.is_some(), "No decimal point in {}", formatted);
            prop_assert_eq!(numeric_part.len() - dot_pos.unwrap() - 1, 2);
        }

        /// A download update never touches the upload label and vice versa.
        #[test]
        fn prop_speed_updates_are_independent(
            download in 0.0f64..10_000.0,
            upload in 0.0f64..10_000.0
        ) {
            let mut state = MonitorState::new();
            state.set_speeds(None, Some(upload));
            state.set_speeds(Some(download), None);

            prop_assert_eq!(state.download_mbps, Some(download));
            prop_assert_eq!(state.upload_mbps, Some(upload));
        }
    }
}
