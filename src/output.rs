//! # Output Configuration
//!
//! Controls CLI output appearance based on terminal capabilities and user
//! preferences. Respects `--color=never|always|auto`, `NO_COLOR`
//! (per <https://no-color.org/>), `CLICOLOR=0`, `CLICOLOR_FORCE=1` and
//! `TERM=dumb`.

use std::env;

/// Output configuration for controlling colors in terminal output.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// - `--color=always`: force colors on (overrides NO_COLOR)
    /// - `--color=never`: force colors off
    /// - `--color=auto`: detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even empty) disables colors
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

    /// Style a branch name for terminal display.
    pub fn branch(&self, name: &str) -> String {
        if self.use_color {
            console::style(name).cyan().to_string()
        } else {
            name.to_string()
        }
    }

    /// Style a repository name for terminal display.
    pub fn repo(&self, name: &str) -> String {
        if self.use_color {
            console::style(name).bold().to_string()
        } else {
            name.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
