//! Rendering of the monitor window using ratatui.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use super::progress::TestPhase;
use super::state::MonitorState;

/// Window background.
pub const BACKGROUND: Color = Color::Rgb(0x2C, 0x2F, 0x33);
/// Button face and progress bar fill.
pub const ACCENT: Color = Color::Rgb(0x72, 0x89, 0xDA);
/// Empty part of the progress bar.
pub const TROUGH: Color = Color::Rgb(0x23, 0x27, 0x2A);
/// Disabled button face.
pub const MUTED: Color = Color::Rgb(0x99, 0xAA, 0xB5);

/// Title shown at the top of the window.
pub const TITLE: &str = "Network Speed Monitor";

const WINDOW_WIDTH: u16 = 60;
const WINDOW_HEIGHT: u16 = 18;
const BUTTON_WIDTH: u16 = 20;

/// Render the monitor window, centred in the frame.
pub fn render_frame(frame: &mut Frame, state: &MonitorState) {
    let area = centered_rect(WINDOW_WIDTH, WINDOW_HEIGHT, frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(BACKGROUND).fg(Color::White));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Margin
            Constraint::Length(1), // Title
            Constraint::Length(1), // Margin
            Constraint::Length(1), // Download speed
            Constraint::Length(1), // Upload speed
            Constraint::Length(1), // Margin
            Constraint::Length(3), // Start button
            Constraint::Length(1), // Margin
            Constraint::Length(1), // Progress bar
            Constraint::Length(1), // Margin
            Constraint::Length(1), // Status
            Constraint::Length(1), // Detail
            Constraint::Min(1),    // Key hints
        ])
        .split(inner);

    render_title(frame, chunks[1]);
    render_speeds(frame, chunks[3], chunks[4], state);
    render_button(frame, chunks[6], state);
    render_progress(frame, chunks[8], state);
    render_status(frame, chunks[10], chunks[11], state);
    render_hints(frame, chunks[12], state);
}

/// Rectangle of at most `width` x `height`, centred in `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    frame.render_widget(title, area);
}

fn render_speeds(
    frame: &mut Frame,
    download_area: Rect,
    upload_area: Rect,
    state: &MonitorState,
) {
    let style = Style::default().fg(Color::White);

    let download = Paragraph::new(state.download_text())
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(download, download_area);

    let upload = Paragraph::new(state.upload_text())
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(upload, upload_area);
}

fn render_button(frame: &mut Frame, area: Rect, state: &MonitorState) {
    let area = centered_rect(BUTTON_WIDTH, area.height, area);

    let face = if state.button.enabled { ACCENT } else { MUTED };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(face));

    let button = Paragraph::new(state.button.label.as_str())
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::White).bg(face).add_modifier(
            if state.button.enabled {
                Modifier::BOLD
            } else {
                Modifier::DIM
            },
        ));
    frame.render_widget(button, area);
}

fn render_progress(frame: &mut Frame, area: Rect, state: &MonitorState) {
    let area = area.inner(Margin { horizontal: 2, vertical: 0 });

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(ACCENT).bg(TROUGH))
        .ratio(state.progress / 100.0)
        .label(format!("{:.0}%", state.progress));
    frame.render_widget(gauge, area);
}

/// Status line text and colour for the current state.
pub fn status_line(state: &MonitorState) -> (String, Color) {
    if let Some(ref error) = state.error {
        return (format!("Test failed: {}", error.message), Color::Red);
    }

    match state.phase {
        TestPhase::Idle => {
            ("Ready to measure your connection.".to_string(), MUTED)
        }
        TestPhase::Connecting => {
            ("Finding the best server...".to_string(), Color::Yellow)
        }
        TestPhase::Download => {
            ("Measuring download speed...".to_string(), Color::Yellow)
        }
        TestPhase::Upload => {
            ("Measuring upload speed...".to_string(), Color::Yellow)
        }
        TestPhase::Complete => {
            let text = match state.last_completed {
                Some(at) => format!("Test finished at {}", at.format("%H:%M:%S")),
                None => "Test finished.".to_string(),
            };
            (text, Color::Green)
        }
        TestPhase::Failed => ("Test failed.".to_string(), Color::Red),
    }
}

/// Secondary line under the status: the suggestion after a failure,
/// otherwise the server in use.
pub fn detail_line(state: &MonitorState) -> Option<String> {
    if let Some(suggestion) =
        state.error.as_ref().and_then(|e| e.suggestion.as_ref())
    {
        return Some(suggestion.clone());
    }

    state.server.as_ref().map(|server| {
        format!("Server: {} | {} ({})", server.colo, server.ip, server.country)
    })
}

fn render_status(
    frame: &mut Frame,
    status_area: Rect,
    detail_area: Rect,
    state: &MonitorState,
) {
    let (text, color) = status_line(state);
    let status = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color));
    frame.render_widget(status, status_area);

    if let Some(detail) = detail_line(state) {
        let color = if state.error.is_some() { Color::Yellow } else { MUTED };
        let detail = Paragraph::new(detail)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color));
        frame.render_widget(detail, detail_area);
    }
}

fn render_hints(frame: &mut Frame, area: Rect, state: &MonitorState) {
    let key = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(MUTED);

    let mut spans = Vec::with_capacity(4);
    if !state.phase.is_running() {
        spans.push(Span::styled("Enter", key));
        spans.push(Span::styled(" start test   ", text));
    }
    spans.push(Span::styled("q", key));
    spans.push(Span::styled(" quit", text));
    let hints = Line::from(spans);

    let paragraph = Paragraph::new(hints).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
