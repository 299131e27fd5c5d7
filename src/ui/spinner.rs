//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::VmdeskTheme;
use super::SpinnerHandle;

/// A progress spinner for a remote operation.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: VmdeskTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str, theme: VmdeskTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, theme }
    }

    /// Create a spinner that doesn't show (quiet and silent modes).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: VmdeskTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_warning(&mut self, msg: &str) {
        let line = self.theme.format_warning(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_finishes() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.set_message("probing xrdp-service");
        spinner.finish_success("xrdp-service");
        assert!(spinner.bar.is_finished());
    }

    #[test]
    fn hidden_spinner_keeps_final_message() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_error("vnc-service");
        assert_eq!(spinner.bar.message(), "✗ vnc-service");
    }

    #[test]
    fn spinner_finish_variants() {
        let mut spinner = ProgressSpinner::new("Testing...", VmdeskTheme::plain());
        spinner.finish_warning("clipboard");
        assert_eq!(spinner.bar.message(), "⚠ clipboard");
    }
}
