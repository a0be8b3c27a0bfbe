//! Backend for Cloudflare's public speed test endpoints.

use log::info;
use tokio::time::Instant;
use url::Url;

use super::client::{Client, BASE_URL};
use super::requests::download::Download;
use super::requests::trace::{Trace, TraceRequest};
use super::requests::upload::Upload;
use super::{MeasurementSession, SpeedBackend};
use crate::errors::{to_measurement_error, MeasurementError};
use crate::measurements::{bps_to_mbps, calculate_bandwidth_bps};
use crate::monitor::state::ServerInfo;
use crate::monitor::TestPhase;

/// Default download payload (25 MB).
pub const DEFAULT_DOWNLOAD_BYTES: u64 = 25_000_000;

/// Default upload payload (10 MB).
pub const DEFAULT_UPLOAD_BYTES: u64 = 10_000_000;

/// Largest payload accepted for either phase (1 GB).
pub const MAX_TRANSFER_BYTES: u64 = 1_000_000_000;

/// Configuration for the Cloudflare backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the speed test server.
    pub base_url: Url,
    /// Bytes fetched during the download phase.
    pub download_bytes: u64,
    /// Bytes sent during the upload phase.
    pub upload_bytes: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BASE_URL).expect("BASE_URL is a valid URL"),
            download_bytes: DEFAULT_DOWNLOAD_BYTES,
            upload_bytes: DEFAULT_UPLOAD_BYTES,
        }
    }
}

/// Opens sessions against a Cloudflare-compatible speed test server.
#[derive(Debug, Clone)]
pub struct CloudflareBackend {
    client: Client,
    config: BackendConfig,
}

impl CloudflareBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { client: Client::new(config.base_url.clone()), config }
    }
}

impl SpeedBackend for CloudflareBackend {
    type Session = CloudflareSession;

    async fn open_session(&self) -> Result<CloudflareSession, MeasurementError> {
        info!("Locating speed test server via {}", self.client.base_url());

        let trace = self.client.send(TraceRequest {}).await.map_err(|e| {
            to_measurement_error(e, TestPhase::Connecting, "server discovery")
        })?;

        info!(
            "Using colo {} ({}) over {} for client {}",
            trace.colo, trace.loc, trace.http, trace.ip
        );

        Ok(CloudflareSession {
            client: self.client.clone(),
            trace,
            download: Download { bytes: self.config.download_bytes },
            upload: Upload::new(self.config.upload_bytes),
        })
    }
}

/// A session bound to the colo reported by the trace endpoint.
pub struct CloudflareSession {
    client: Client,
    trace: Trace,
    download: Download,
    upload: Upload,
}

impl MeasurementSession for CloudflareSession {
    fn server(&self) -> Option<ServerInfo> {
        Some(ServerInfo {
            colo: self.trace.colo.clone(),
            ip: self.trace.ip.clone(),
            country: self.trace.loc.clone(),
        })
    }

    async fn download(&mut self) -> Result<f64, MeasurementError> {
        info!("Beginning download test: {} bytes", self.download.bytes);

        let start = Instant::now();
        let received =
            self.client.receive(&self.download).await.map_err(|e| {
                to_measurement_error(e, TestPhase::Download, "download test")
            })?;
        let elapsed = start.elapsed();

        let bps = calculate_bandwidth_bps(received, elapsed);
        info!(
            "Downloaded {} bytes in {:?} ({:.2} Mbps)",
            received,
            elapsed,
            bps_to_mbps(bps)
        );

        Ok(bps)
    }

    async fn upload(&mut self) -> Result<f64, MeasurementError> {
        let bytes = self.upload.bytes();
        info!("Beginning upload test: {} bytes", bytes);

        let start = Instant::now();
        self.client.execute(&self.upload).await.map_err(|e| {
            to_measurement_error(e, TestPhase::Upload, "upload test")
        })?;
        let elapsed = start.elapsed();

        let bps = calculate_bandwidth_bps(bytes, elapsed);
        info!(
            "Uploaded {} bytes in {:?} ({:.2} Mbps)",
            bytes,
            elapsed,
            bps_to_mbps(bps)
        );

        Ok(bps)
    }
}
