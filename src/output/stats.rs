//! End-of-run statistics
//!
//! This module provides the summary a mirror run returns and its console
//! rendering.

use crate::state::ErrorEntry;
use std::fmt::Write;
use std::time::Duration;

/// What a completed mirror run did
#[derive(Debug, Clone)]
pub struct MirrorSummary {
    /// Number of listing pages fetched
    pub pages: u32,

    /// Number of galleries discovered
    pub galleries: usize,

    /// Number of pictures discovered
    pub pictures: usize,

    /// Errors recorded during the run, in order
    pub errors: Vec<ErrorEntry>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl MirrorSummary {
    /// Returns true if no error was recorded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Renders a summary as human-readable text
pub fn render_summary(summary: &MirrorSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Mirror Summary ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Listing pages fetched: {}", summary.pages);
    let _ = writeln!(out, "  Galleries discovered: {}", summary.galleries);
    let _ = writeln!(out, "  Pictures discovered: {}", summary.pictures);
    let _ = writeln!(out, "  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    let _ = writeln!(out);

    if summary.is_clean() {
        let _ = writeln!(out, "No errors recorded.");
    } else {
        let _ = writeln!(out, "Errors ({}):", summary.errors.len());
        for entry in &summary.errors {
            let _ = writeln!(
                out,
                "  [{}] {}",
                entry.at.format("%Y-%m-%d %H:%M:%S"),
                entry.message
            );
        }
    }

    out
}

/// Prints a summary to stdout
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &MirrorSummary) {
    print!("{}", render_summary(summary));
}
