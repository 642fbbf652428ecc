//! In-memory operational log with daily rotation.
//!
//! Lines are kept for the current UTC calendar day only. The first append on
//! a new day clears the buffer; whether to rotate is decided by
//! [`needs_rotation`], a pure function of the two dates involved.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::obs::{ObservabilityPort, StageEvent};

/// `true` when a line stamped in `current` must not share a buffer with
/// lines from `last`.
pub fn needs_rotation(current: NaiveDate, last: NaiveDate) -> bool {
    current != last
}

#[derive(Debug)]
struct Buffer {
    epoch: NaiveDate,
    lines: Vec<String>,
}

/// Process-wide text log surfaced to operators (`riskgraph run --show-log`).
#[derive(Debug)]
pub struct OperationalLog {
    buffer: Mutex<Buffer>,
}

impl Default for OperationalLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationalLog {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Buffer {
                epoch: Utc::now().date_naive(),
                lines: Vec::new(),
            }),
        }
    }

    pub fn append(&self, message: impl AsRef<str>) {
        self.append_at(Utc::now(), message);
    }

    /// Append a line stamped with `at`, rotating first if `at` falls on a
    /// different day than the buffered lines.
    pub fn append_at(&self, at: DateTime<Utc>, message: impl AsRef<str>) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let day = at.date_naive();
        if needs_rotation(day, buffer.epoch) {
            buffer.lines.clear();
            buffer.epoch = day;
        }
        buffer
            .lines
            .push(format!("{} {}", at.format("%Y-%m-%d %H:%M:%S"), message.as_ref()));
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lines
            .clone()
    }

    pub fn render(&self) -> String {
        self.snapshot().join("\n")
    }
}

impl ObservabilityPort for OperationalLog {
    fn record(&self, event: &StageEvent) {
        let line = match &event.detail {
            Some(detail) => format!(
                "[{}] {} {}: {}",
                event.run_id, event.stage, event.transition, detail
            ),
            None => format!("[{}] {} {}", event.run_id, event.stage, event.transition),
        };
        self.append_at(event.timestamp, line);
    }
}
