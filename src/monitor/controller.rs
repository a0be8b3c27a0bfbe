//! Controller for the interactive monitor window.
//!
//! Owns the terminal and the [`MonitorState`], starts measurement runs on a
//! worker task and applies the [`ProgressEvent`]s they send back. All state
//! mutation happens here, on the UI loop.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use log::{debug, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

use super::progress::{ProgressEvent, TestPhase};
use super::renderer::render_frame;
use super::runner::Runner;
use super::state::MonitorState;
use crate::backend::SpeedBackend;
use crate::errors::ErrorKind;

/// What a key press asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    StartTest,
    Quit,
}

/// Map a key event to an action. Only presses count.
pub fn action_for_key(key: KeyEvent) -> Option<MonitorAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL)
        && key.code == KeyCode::Char('c')
    {
        return Some(MonitorAction::Quit);
    }

    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => {
            Some(MonitorAction::StartTest)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(MonitorAction::Quit),
        _ => None,
    }
}

/// Wait up to `timeout` for a terminal event.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Controller for the monitor window.
pub struct MonitorController {
    /// Everything the window shows
    state: MonitorState,
    /// Terminal instance, present between `init` and `cleanup`
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Events from the run in flight, if any
    updates: Option<UnboundedReceiver<ProgressEvent>>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            state: MonitorState::new(),
            terminal: None,
            initialized: false,
            updates: None,
        }
    }

    /// Enter raw mode and the alternate screen, and hide the cursor.
    pub fn init(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        enable_raw_mode()?;
        self.initialized = true;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend)?);

        Ok(())
    }

    /// Restore the terminal to the state it was in before `init`.
    pub fn cleanup(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.initialized {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
        }

        disable_raw_mode()?;

        self.initialized = false;
        self.terminal = None;

        Ok(())
    }

    /// Draw the window. A no-op before `init`.
    pub fn render(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref mut terminal) = self.terminal {
            let state = &self.state;
            terminal.draw(|frame| render_frame(frame, state))?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Start a measurement run on a worker task.
    ///
    /// The button is locked before the task is spawned. Returns false, and
    /// does nothing, while a run is already in flight.
    pub fn start_test<B>(&mut self, backend: &Arc<B>, runner: Runner) -> bool
    where
        B: SpeedBackend + 'static,
    {
        if self.state.is_busy() {
            debug!("Ignoring start request while a run is in flight");
            return false;
        }

        self.state.begin_run();

        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = Some(rx);

        let backend = Arc::clone(backend);
        tokio::spawn(async move {
            runner.run(backend.as_ref(), &tx).await;
        });

        true
    }

    /// Apply every event the worker has sent since the last tick.
    pub fn drain_updates(&mut self) {
        let Some(rx) = self.updates.as_mut() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => self.state.update_from_event(&event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.state.is_busy() {
                        warn!("Measurement task ended without finishing the run");
                        self.state.set_error(
                            ErrorKind::Unknown,
                            "measurement task ended unexpectedly".to_string(),
                            None,
                        );
                        self.state.phase = TestPhase::Failed;
                        self.state.set_busy(false);
                    }
                    self.updates = None;
                    break;
                }
            }
        }
    }

    /// Run the UI loop until the user quits.
    ///
    /// Each tick applies pending updates, redraws, then waits up to `tick`
    /// for a key press.
    pub fn run<B>(
        &mut self,
        backend: Arc<B>,
        runner: Runner,
        tick: Duration,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        B: SpeedBackend + 'static,
    {
        loop {
            self.drain_updates();
            self.render()?;

            if let Some(Event::Key(key)) = poll_event(tick)? {
                match action_for_key(key) {
                    Some(MonitorAction::Quit) => break,
                    Some(MonitorAction::StartTest) => {
                        self.start_test(&backend, runner);
                    }
                    None => {}
                }
            }
        }

        Ok(())
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{ScriptedBackend, Step};
    use crate::monitor::progress::ProgressStyle;
    use crate::monitor::runner::RunnerConfig;
    use crate::monitor::state::ButtonLabel;

    fn instant_runner() -> Runner {
        Runner::new(RunnerConfig {
            style: ProgressStyle::Stepped,
            animation_duration: Duration::ZERO,
            animation_steps: 0,
        })
    }

    async fn drain_until_idle(controller: &mut MonitorController) {
        for _ in 0..1000 {
            controller.drain_updates();
            if !controller.state().is_busy() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("run never finished");
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_new_controller_shows_initial_layout() {
        let controller = MonitorController::new();
        let state = controller.state();

        assert_eq!(state.phase, TestPhase::Idle);
        assert_eq!(state.button.label, ButtonLabel::Start);
        assert!(controller.terminal.is_none());
    }

    #[test]
    fn test_render_and_cleanup_noop_before_init() {
        let mut controller = MonitorController::new();
        assert!(controller.render().is_ok());
        assert!(controller.cleanup().is_ok());
    }

    #[tokio::test]
    async fn test_start_test_locks_button_before_run() {
        let mut controller = MonitorController::new();
        let backend = Arc::new(ScriptedBackend::succeeding(1.0, 1.0));

        assert!(controller.start_test(&backend, instant_runner()));
        assert!(controller.state().is_busy());
        assert_eq!(controller.state().button.label.as_str(), "Testing...");

        // A second start while busy is ignored
        assert!(!controller.start_test(&backend, instant_runner()));
        assert_eq!(controller.state().runs_started, 1);

        drain_until_idle(&mut controller).await;
    }

    #[tokio::test]
    async fn test_full_run_updates_window() {
        let mut controller = MonitorController::new();
        let backend =
            Arc::new(ScriptedBackend::succeeding(100_000_000.0, 50_500_000.0));

        controller.start_test(&backend, instant_runner());
        drain_until_idle(&mut controller).await;

        let state = controller.state();
        assert_eq!(state.download_text(), "Download Speed: 100.00 Mbps");
        assert_eq!(state.upload_text(), "Upload Speed: 50.50 Mbps");
        assert_eq!(state.progress, 100.0);
        assert_eq!(state.button.label.as_str(), "Restart Test");
        assert!(state.button.enabled);
    }

    #[tokio::test]
    async fn test_failed_run_reenables_button() {
        let mut controller = MonitorController::new();
        let backend = Arc::new(ScriptedBackend {
            session: Some(ErrorKind::Network),
            download: Step::Ok(1.0),
            upload: Step::Ok(1.0),
        });

        controller.start_test(&backend, instant_runner());
        drain_until_idle(&mut controller).await;

        let state = controller.state();
        assert_eq!(state.phase, TestPhase::Failed);
        assert_eq!(state.download_text(), "Download Speed: -- Mbps");
        assert_eq!(state.button.label, ButtonLabel::Restart);

        // A new run can be started afterwards
        assert!(controller.start_test(&backend, instant_runner()));
        drain_until_idle(&mut controller).await;
    }

    #[test]
    fn test_disconnect_while_busy_recovers() {
        let mut controller = MonitorController::new();
        controller.state.begin_run();

        let (tx, rx) = mpsc::unbounded_channel::<ProgressEvent>();
        drop(tx);
        controller.updates = Some(rx);

        controller.drain_updates();

        let state = controller.state();
        assert!(state.button.enabled);
        assert_eq!(state.phase, TestPhase::Failed);
        assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::Unknown);
        assert!(controller.updates.is_none());
    }

    #[test]
    fn test_start_keys() {
        for code in [KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('s')] {
            assert_eq!(action_for_key(press(code)), Some(MonitorAction::StartTest));
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(action_for_key(press(KeyCode::Char('q'))), Some(MonitorAction::Quit));
        assert_eq!(action_for_key(press(KeyCode::Esc)), Some(MonitorAction::Quit));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(ctrl_c), Some(MonitorAction::Quit));
    }

    #[test]
    fn test_ignored_keys() {
        assert_eq!(action_for_key(press(KeyCode::Char('c'))), None);
        assert_eq!(action_for_key(press(KeyCode::Tab)), None);

        let release = KeyEvent::new_with_kind(
            KeyCode::Enter,
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(action_for_key(release), None);
    }
}
