//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying spinners and
//! formatted messages to the user.

use indicatif::{ProgressBar, ProgressStyle};
use serde_yaml::Value;

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Render a configuration value for the terminal
///
/// Scalars print bare; collections print as a YAML block.
pub fn format_value(value: &Value) -> anyhow::Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => serde_yaml::to_string(value)?.trim_end().to_string(),
    })
}

/// Print an error with its full cause chain to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error {error:#}", status::ERROR);
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_scalars_bare() {
        assert_eq!(format_value(&Value::String("x".to_string())).unwrap(), "x");
        assert_eq!(format_value(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(format_value(&Value::Null).unwrap(), "");
    }

    #[test]
    fn test_format_mapping_as_yaml() {
        let value: Value = serde_yaml::from_str("a: 1\nb: two").unwrap();
        assert_eq!(format_value(&value).unwrap(), "a: 1\nb: two");
    }
}
