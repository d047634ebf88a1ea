//! # Output Configuration
//!
//! Controls how the CLI decorates what it prints. Colour and status markers
//! follow the `--color` flag and the usual environment conventions:
//!
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colour when set (any value)
//! - `CLICOLOR=0` disables colour, `CLICOLOR_FORCE=1` forces it
//! - `TERM=dumb` disables colour
//!
//! Task reports written through [`crate::tasks`] are never decorated, so they
//! read the same when redirected to a file.

use std::env;

use console::style;

/// Whether decorated output is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag value against the environment.
    ///
    /// Unknown flag values behave like `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Prefix for a status line.
    pub fn marker(&self, marker: Marker) -> &'static str {
        if self.use_color {
            marker.emoji()
        } else {
            marker.plain()
        }
    }

    /// Render an error label, red when colour is on.
    pub fn error_label(&self, kind: &str) -> String {
        let label = format!("error[{}]", kind);
        if self.use_color {
            style(label).red().bold().force_styling(true).to_string()
        } else {
            label
        }
    }

    /// Render a heading, bold when colour is on.
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Status line markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Sync,
    Success,
    UpToDate,
    Warning,
    Task,
}

impl Marker {
    fn emoji(self) -> &'static str {
        match self {
            Marker::Sync => "🔄",
            Marker::Success => "✅",
            Marker::UpToDate => "✨",
            Marker::Warning => "⚠️",
            Marker::Task => "🔧",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Marker::Sync => "[SYNC]",
            Marker::Success => "[OK]",
            Marker::UpToDate => "[UP-TO-DATE]",
            Marker::Warning => "[WARN]",
            Marker::Task => "[TASK]",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(OutputConfig::from_env_and_flag("ALWAYS").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_marker_with_color() {
        assert_eq!(OutputConfig::with_color().marker(Marker::Success), "✅");
    }

    #[test]
    fn test_marker_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(config.marker(Marker::Success), "[OK]");
        assert_eq!(config.marker(Marker::UpToDate), "[UP-TO-DATE]");
    }

    #[test]
    fn test_error_label_plain() {
        assert_eq!(
            OutputConfig::without_color().error_label("UnknownTaskError"),
            "error[UnknownTaskError]"
        );
    }

    #[test]
    fn test_error_label_colored_keeps_text() {
        let label = OutputConfig::with_color().error_label("IOError");
        assert!(label.contains("error[IOError]"));
        assert_ne!(label, "error[IOError]");
    }
}
