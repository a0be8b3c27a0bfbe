//! Display mode detection.
//!
//! Picks between the interactive window, plain headless output and JSON
//! output from the CLI flags and the terminal.

/// How the monitor presents itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Interactive window with a start button
    Tui,
    /// One headless run, results printed as plain lines
    Plain,
    /// One headless run, results printed as JSON
    Json,
}

impl DisplayMode {
    /// Determine display mode from CLI flags and environment.
    ///
    /// `interactive` is true when stdout is a terminal and headless output
    /// was not requested. The JSON flag wins over everything else.
    pub fn detect(json_flag: bool, interactive: bool) -> Self {
        if json_flag {
            DisplayMode::Json
        } else if interactive {
            DisplayMode::Tui
        } else {
            DisplayMode::Plain
        }
    }

    /// Whether this mode runs a single measurement without a window.
    pub fn is_headless(self) -> bool {
        self != DisplayMode::Tui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_json_flag_wins() {
        assert_eq!(DisplayMode::detect(true, true), DisplayMode::Json);
        assert_eq!(DisplayMode::detect(true, false), DisplayMode::Json);
    }

    #[test]
    fn test_interactive_terminal_gets_window() {
        assert_eq!(DisplayMode::detect(false, true), DisplayMode::Tui);
        assert!(!DisplayMode::Tui.is_headless());
    }

    #[test]
    fn test_non_interactive_gets_plain_output() {
        assert_eq!(DisplayMode::detect(false, false), DisplayMode::Plain);
        assert!(DisplayMode::Plain.is_headless());
        assert!(DisplayMode::Json.is_headless());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The window is only chosen for an interactive run without --json.
        #[test]
        fn prop_window_requires_interactive_without_json(
            json_flag in any::<bool>(),
            interactive in any::<bool>()
        ) {
            let mode = DisplayMode::detect(json_flag, interactive);

            prop_assert_eq!(mode == DisplayMode::Tui, !json_flag && interactive);
            prop_assert_eq!(mode == DisplayMode::Json, json_flag);
        }
    }
}
