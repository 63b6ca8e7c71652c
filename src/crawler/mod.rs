//! Crawler module for discovering and mirroring galleries
//!
//! This module contains the core mirroring logic, including:
//! - Admission control for network and local work
//! - The idempotent fetch-to-file primitive
//! - Listing and metadata parsing
//! - Gallery and picture fetchers
//! - The listing frontier and the drain that detects completion

mod coordinator;
mod entities;
mod fetcher;
mod frontier;
mod gate;
mod parser;

pub use coordinator::{run_mirror, Mirror};
pub use fetcher::{build_http_client, fetch_bytes, fetch_text, fetch_to_file, FetchOutcome};
pub use gate::{AdmissionGate, OpClass, OperationHandle, PendingOp};
pub use parser::{parse_listing, parse_media_set, MediaSet};
