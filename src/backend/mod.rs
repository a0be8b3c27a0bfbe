//! Measurement backends.
//!
//! The monitor never measures anything itself. A [`SpeedBackend`] opens a
//! [`MeasurementSession`] (server discovery happens here), and the session
//! reports download and upload throughput in bits per second.

pub mod client;
pub mod cloudflare;
pub mod requests;
#[cfg(test)]
pub mod scripted;

use std::future::Future;

use crate::errors::MeasurementError;
use crate::monitor::state::ServerInfo;

pub use cloudflare::{BackendConfig, CloudflareBackend};

/// Something that can open measurement sessions.
pub trait SpeedBackend: Send + Sync {
    /// Session type produced by this backend.
    type Session: MeasurementSession;

    /// Acquire a session, performing whatever server discovery the backend
    /// needs.
    fn open_session(
        &self,
    ) -> impl Future<Output = Result<Self::Session, MeasurementError>> + Send;
}

/// A connected session able to run the two measurement phases.
pub trait MeasurementSession: Send {
    /// Server the session is talking to, if the backend knows it.
    fn server(&self) -> Option<ServerInfo>;

    /// Measure download throughput in bits per second.
    fn download(
        &mut self,
    ) -> impl Future<Output = Result<f64, MeasurementError>> + Send;

    /// Measure upload throughput in bits per second.
    fn upload(
        &mut self,
    ) -> impl Future<Output = Result<f64, MeasurementError>> + Send;
}
