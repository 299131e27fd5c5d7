//! Visual theme and styling.

use console::Style;

/// vmdesk's visual theme.
#[derive(Debug, Clone)]
pub struct VmdeskTheme {
    /// Present / succeeded (green).
    pub success: Style,
    /// Missing (orange).
    pub warning: Style,
    /// Errors and failed fixes (red bold).
    pub error: Style,
    pub highlight: Style,
    pub header: Style,
    /// Contextual hints (cyan dim).
    pub hint: Style,
}

impl Default for VmdeskTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl VmdeskTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            hint: Style::new().cyan().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            hint: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_hint(&self, msg: &str) -> String {
        format!("{}", self.hint.apply_to(format!("→ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▣"),
            self.highlight.apply_to(title)
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_success() {
        let msg = VmdeskTheme::plain().format_success("xrdp-service");
        assert_eq!(msg, "✓ xrdp-service");
    }

    #[test]
    fn theme_formats_warning() {
        let msg = VmdeskTheme::plain().format_warning("vnc-password");
        assert!(msg.starts_with("⚠"));
    }

    #[test]
    fn theme_formats_error() {
        let msg = VmdeskTheme::plain().format_error("Failed");
        assert!(msg.contains("✗"));
        assert!(msg.contains("Failed"));
    }

    #[test]
    fn theme_formats_hint() {
        let msg = VmdeskTheme::plain().format_hint("Run with --fix");
        assert_eq!(msg, "→ Run with --fix");
    }

    #[test]
    fn theme_formats_header() {
        let msg = VmdeskTheme::plain().format_header("desk (proj/us-central1-a)");
        assert!(msg.contains("desk (proj/us-central1-a)"));
    }

    #[test]
    fn default_impl_matches_new() {
        assert_eq!(
            VmdeskTheme::default().format_success("test"),
            VmdeskTheme::new().format_success("test")
        );
    }
}
