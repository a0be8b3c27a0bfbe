//! Error types for the speed monitor.
//!
//! Every backend failure is folded into a [`MeasurementError`] that records
//! which phase of the run failed, a user-facing message and, where one is
//! known, a suggestion for resolving it.

use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::monitor::TestPhase;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// The server could not be reached or the transfer broke off.
    pub const NETWORK_ERROR: i32 = 1;
    /// The server answered with an error status.
    pub const API_ERROR: i32 = 2;
    /// Bad arguments or an unusable log file.
    pub const CONFIG_ERROR: i32 = 3;
    /// The terminal could not be prepared for the monitor window.
    pub const TERMINAL_ERROR: i32 = 4;
    pub const UNKNOWN_ERROR: i32 = 99;
    /// Interrupted by Ctrl-C during a headless run.
    pub const INTERRUPTED: i32 = 130;
}

/// What went wrong, as far as the user needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Dns,
    Timeout,
    Tls,
    /// The server answered, but with an error status
    Api,
    Config,
    Unknown,
}

/// Message fragments that identify a kind of failure, checked in order.
const MESSAGE_PATTERNS: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::Dns, &["dns", "resolve", "no such host"]),
    (ErrorKind::Timeout, &["timeout", "timed out", "deadline"]),
    (ErrorKind::Tls, &["tls", "ssl", "certificate", "handshake"]),
    (
        ErrorKind::Network,
        &[
            "connection refused",
            "connection reset",
            "network unreachable",
            "host unreachable",
            "no route",
            "broken pipe",
        ],
    ),
    (ErrorKind::Api, &["status: 4", "status: 5", "server error"]),
];

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Network
            | ErrorKind::Dns
            | ErrorKind::Timeout
            | ErrorKind::Tls => exit_codes::NETWORK_ERROR,
            ErrorKind::Api => exit_codes::API_ERROR,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            ErrorKind::Unknown => exit_codes::UNKNOWN_ERROR,
        }
    }

    /// Short label used as the prefix of the error's Display output.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error",
            ErrorKind::Dns => "Name lookup failed",
            ErrorKind::Timeout => "Timed out",
            ErrorKind::Tls => "Secure connection failed",
            ErrorKind::Api => "Speed test server error",
            ErrorKind::Config => "Invalid configuration",
            ErrorKind::Unknown => "Unexpected error",
        }
    }

    /// Default hint shown under the failure status.
    pub fn suggestion(&self) -> Option<&'static str> {
        let hint = match self {
            ErrorKind::Network => "Make sure you are online, then restart the test.",
            ErrorKind::Dns => "The server name could not be resolved. Check your DNS settings.",
            ErrorKind::Timeout => "The server is slow or unreachable. Try again in a moment.",
            ErrorKind::Tls => "Certificate check failed. Make sure your clock is correct.",
            ErrorKind::Api => "The speed test server is having trouble. Try again later.",
            ErrorKind::Config | ErrorKind::Unknown => return None,
        };

        Some(hint)
    }
}

/// A failure raised while creating a session or measuring a phase.
#[derive(Debug)]
pub struct MeasurementError {
    pub kind: ErrorKind,
    /// Phase of the run that failed
    pub phase: TestPhase,
    /// Message shown in the status line
    pub message: String,
    pub suggestion: Option<String>,
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl MeasurementError {
    /// New error carrying the default suggestion for `kind`.
    pub fn new(
        kind: ErrorKind,
        phase: TestPhase,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            phase,
            message: message.into(),
            suggestion: kind.suggestion().map(str::to_string),
            source: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Error raised before any run starts.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, TestPhase::Idle, message)
    }
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }

        Ok(())
    }
}

impl Error for MeasurementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Guess an [`ErrorKind`] from an error's message.
pub fn classify_error(error: &dyn Error) -> ErrorKind {
    let message = error.to_string().to_lowercase();

    MESSAGE_PATTERNS
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| message.contains(f)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify a reqwest error, preferring its own predicates over the
/// message text.
pub fn classify_reqwest_error(error: &reqwest::Error) -> ErrorKind {
    if error.is_timeout() {
        return ErrorKind::Timeout;
    }

    if error.is_status() {
        return ErrorKind::Api;
    }

    // Connect failures wrap DNS and TLS problems too; let the message
    // decide before falling back to a plain network error.
    match classify_error(error) {
        ErrorKind::Unknown if error.is_connect() => ErrorKind::Network,
        kind => kind,
    }
}

/// Wrap a backend error for `phase`, prefixing its message with `context`.
pub fn to_measurement_error(
    error: Box<dyn Error + Send + Sync>,
    phase: TestPhase,
    context: &str,
) -> MeasurementError {
    let kind = match error.downcast_ref::<reqwest::Error>() {
        Some(reqwest_error) => classify_reqwest_error(reqwest_error),
        None => classify_error(error.as_ref()),
    };

    let mut wrapped =
        MeasurementError::new(kind, phase, format!("{}: {}", context, error));
    wrapped.source = Some(error);
    wrapped
}

/// Text printed on stderr for a failure outside the window.
pub fn format_error_for_display(message: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(suggestion) => {
            format!("Error: {}\n\nSuggestion: {}", message, suggestion)
        }
        None => format!("Error: {}", message),
    }
}
