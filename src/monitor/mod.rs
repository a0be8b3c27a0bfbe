//! The network speed monitor: window state, rendering, the interactive
//! controller, headless runs and the measurement runner.

pub mod controller;
pub mod display_mode;
pub mod headless;
pub mod progress;
pub mod renderer;
pub mod runner;
pub mod state;

pub use controller::MonitorController;
pub use display_mode::DisplayMode;
pub use progress::{ProgressStyle, TestPhase};
pub use runner::{Runner, RunnerConfig};
