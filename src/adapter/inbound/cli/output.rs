//! Terminal output formatting.
//!
//! Human-readable output uses colored symbols and aligned fields. In JSON
//! mode every helper except [`document`] and [`error`] is silent, so stdout
//! carries exactly one JSON document for scripting.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit a machine-readable JSON document instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    *config_cell().read()
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *config_cell().write() = config;
}

/// Return whether machine-readable JSON output is enabled.
#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Return the global verbosity level from `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    read_config().verbose
}

fn suppressed() -> bool {
    let config = read_config();
    config.json || config.quiet
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    if suppressed() {
        return;
    }
    println!("{} {}", "buylist".bold(), version.dimmed());
}

/// Print a section header.
pub fn section(title: &str) {
    if suppressed() {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if suppressed() {
        return;
    }
    println!("  {:<14} {}", label.dimmed(), value);
}

/// Print a success line.
pub fn success(message: &str) {
    if suppressed() {
        return;
    }
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line. Shown in quiet mode too.
pub fn warning(message: &str) {
    if is_json() {
        return;
    }
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "error": message }));
        return;
    }
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a rendered table, indented.
pub fn table(rendered: impl Display) {
    if suppressed() {
        return;
    }
    for line in rendered.to_string().lines() {
        println!("  {line}");
    }
}

/// Print `value` as the JSON document of this invocation.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn document<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.cyan())
}
