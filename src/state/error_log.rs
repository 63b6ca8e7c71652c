//! Append-only log of failures recorded during a run

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// One recorded failure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Ordered, append-only sequence of failure messages
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<ErrorEntry>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message stamped with the current time
    pub fn record(&self, message: impl Into<String>) {
        let entry = ErrorEntry {
            at: Utc::now(),
            message: message.into(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries in recording order
    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
