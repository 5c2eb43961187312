//! Output formatting for cfgload
//!
//! Progress lines and diffs go to stdout; errors and warnings go to stderr.

use colored::Colorize;
use std::io::{self, Write};

use crate::diff::{self, DiffStats};
use crate::transaction::Reporter;

/// Output formatter for operator-facing messages
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var_os("NO_COLOR").is_none();

        Self {
            use_color,
            verbosity,
        }
    }

    /// Whether ANSI colors are emitted
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a progress line
    pub fn status(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.error_line(message));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.warning_line(message));
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a device diff, or a note that there is nothing to commit
    pub fn print_diff(&self, diff: Option<&str>) {
        match diff {
            Some(text) => {
                println!("{}", diff::render(text, self.use_color));
                let stats = DiffStats::from_diff(text);
                if self.use_color {
                    self.info(&stats.short_summary_colored());
                } else {
                    self.info(&stats.short_summary());
                }
            }
            None if self.use_color => println!("{}", "(no changes)".bright_black()),
            None => println!("(no changes)"),
        }
    }

    /// Flush stdout before blocking on input
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }

    fn error_line(&self, message: &str) -> String {
        if self.use_color {
            format!("{} {}", "ERROR:".red().bold(), message)
        } else {
            format!("ERROR: {}", message)
        }
    }

    fn warning_line(&self, message: &str) -> String {
        if self.use_color {
            format!("{} {}", "WARNING:".yellow().bold(), message)
        } else {
            format!("WARNING: {}", message)
        }
    }
}

impl Reporter for OutputFormatter {
    fn step(&self, message: &str) {
        self.status(message);
    }

    fn warning(&self, message: &str) {
        OutputFormatter::warning(self, message);
    }

    fn failure(&self, message: &str) {
        self.error(message);
    }

    fn diff(&self, diff: Option<&str>) {
        self.print_diff(diff);
        self.flush();
    }
}
