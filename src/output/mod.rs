//! Output module for reporting mirror results
//!
//! This module handles summarizing a finished run for the console.

pub mod stats;

pub use stats::{print_summary, render_summary, MirrorSummary};
