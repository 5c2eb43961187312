//! Presentation of Junos configuration diffs.
//!
//! The device returns diffs in its own "show | compare" layout:
//!
//! ```text
//! [edit interfaces ge-0/0/0 unit 0]
//! -    description uplink;
//! +    description "core uplink";
//! ```
//!
//! This module colors that text and summarizes it.

use colored::Colorize;
use std::fmt;

/// Statistics about a configuration diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of `[edit ...]` sections
    pub sections: usize,
    /// Number of lines added
    pub insertions: usize,
    /// Number of lines removed
    pub deletions: usize,
}

impl DiffStats {
    /// Count sections and changed lines in a device diff.
    pub fn from_diff(diff: &str) -> Self {
        let mut stats = Self::default();
        for line in diff.lines() {
            match line.trim_start().chars().next() {
                Some('[') if line.trim_start().starts_with("[edit") => stats.sections += 1,
                _ if line.starts_with('+') => stats.insertions += 1,
                _ if line.starts_with('-') => stats.deletions += 1,
                _ => {}
            }
        }
        stats
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.insertions > 0 || self.deletions > 0
    }

    /// Format as a short summary string
    pub fn short_summary(&self) -> String {
        format!(
            "{} section(s), +{} -{}",
            self.sections, self.insertions, self.deletions
        )
    }

    /// Format as a colored short summary
    pub fn short_summary_colored(&self) -> String {
        format!(
            "{} section(s), {} {}",
            self.sections.to_string().bright_white(),
            format!("+{}", self.insertions).green(),
            format!("-{}", self.deletions).red()
        )
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_summary())
    }
}

/// Render a device diff for the terminal.
///
/// Section headers are cyan, additions green, removals red; other lines
/// pass through unchanged. Without color the text is returned as is.
pub fn render(diff: &str, use_color: bool) -> String {
    if !use_color {
        return diff.to_string();
    }

    diff.lines()
        .map(|line| {
            if line.trim_start().starts_with("[edit") {
                line.cyan().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
