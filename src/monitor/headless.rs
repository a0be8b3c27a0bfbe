//! Headless runs.
//!
//! Runs a single measurement without the window, printing results either
//! as plain lines while the run progresses or as JSON once it is over.

use std::sync::Arc;

use colored::Colorize;
use log::error;
use tokio::sync::mpsc;

use super::display_mode::DisplayMode;
use super::progress::{ProgressEvent, TestPhase};
use super::runner::Runner;
use super::state::{format_speed, MonitorState};
use crate::backend::SpeedBackend;
use crate::errors::{format_error_for_display, ErrorKind};
use crate::results::RunSummary;

/// Run one measurement and return its summary.
///
/// In [`DisplayMode::Plain`] each result is printed as it arrives; in the
/// other modes nothing is printed here.
pub async fn run_once<B>(
    backend: Arc<B>,
    runner: Runner,
    mode: DisplayMode,
) -> RunSummary
where
    B: SpeedBackend + 'static,
{
    let mut state = MonitorState::new();
    state.begin_run();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        runner.run(backend.as_ref(), &tx).await;
    });

    while let Some(event) = rx.recv().await {
        if mode == DisplayMode::Plain {
            print_event(&event);
        }
        state.update_from_event(&event);
    }

    if let Err(e) = task.await {
        error!("Measurement task failed: {}", e);
        if state.is_busy() {
            state.set_error(ErrorKind::Unknown, e.to_string(), None);
            state.phase = TestPhase::Failed;
            state.set_busy(false);
        }
    }

    RunSummary::from_state(&state)
}

/// Plain output line for an event, if it produces one.
pub fn plain_line(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::SessionOpened(server) => Some(format!(
            "{} {} {}",
            "Server:".bold().white(),
            server.colo.bright_blue(),
            format!("({} | {})", server.ip, server.country).bright_blue()
        )),
        ProgressEvent::Speeds { download_mbps: Some(speed), .. } => Some(format!(
            "{} {}",
            "Download Speed:".bold().white(),
            format_speed(Some(*speed)).bright_cyan()
        )),
        ProgressEvent::Speeds { upload_mbps: Some(speed), .. } => Some(format!(
            "{} {}",
            "Upload Speed:".bold().white(),
            format_speed(Some(*speed)).bright_cyan()
        )),
        _ => None,
    }
}

fn print_event(event: &ProgressEvent) {
    if let ProgressEvent::Failed { message, suggestion, .. } = event {
        eprintln!(
            "{}",
            format_error_for_display(message, suggestion.as_deref()).red()
        );
    } else if let Some(line) = plain_line(event) {
        println!("{}", line);
    }
}

/// Print a run summary as pretty JSON on stdout.
pub fn print_summary(summary: &RunSummary) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
