//! Per-student cooldown between accepted attendance marks.
//!
//! The ledger of last accepted marks lives only as long as the
//! [`AttendanceMarker`]; a new process starts with every student eligible.

use crate::attendance_log::{LogEntry, LogError, LogSink};
use crate::clock::Clock;
use chrono::{DateTime, Local, TimeDelta};
use std::collections::HashMap;

/// Minimum time between two accepted marks of the same student.
pub const COOLDOWN_PERIOD: TimeDelta = TimeDelta::minutes(75);

/// Result of a mark attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkOutcome {
    /// A row was appended to the log.
    Marked(LogEntry),
    /// The student was marked less than one cooldown period ago.
    AlreadyMarked {
        last_marked: DateTime<Local>,
        eligible_at: DateTime<Local>,
    },
}

impl MarkOutcome {
    pub fn is_marked(&self) -> bool {
        matches!(self, MarkOutcome::Marked(_))
    }
}

pub struct AttendanceMarker<C: Clock> {
    clock: C,
    cooldown: TimeDelta,
    last_marked: HashMap<String, DateTime<Local>>,
}

impl<C: Clock> AttendanceMarker<C> {
    pub fn new(clock: C) -> Self {
        Self::with_cooldown(clock, COOLDOWN_PERIOD)
    }

    pub fn with_cooldown(clock: C, cooldown: TimeDelta) -> Self {
        Self {
            clock,
            cooldown,
            last_marked: HashMap::new(),
        }
    }

    /// Try to mark `name` present now.
    ///
    /// The ledger is only updated once the row has been written.
    pub fn mark(&mut self, name: &str, sink: &mut dyn LogSink) -> Result<MarkOutcome, LogError> {
        let now = self.clock.now();

        if let Some(&last) = self.last_marked.get(name) {
            if now - last < self.cooldown {
                tracing::debug!(student = name, last = %last, "within cooldown");
                return Ok(MarkOutcome::AlreadyMarked {
                    last_marked: last,
                    eligible_at: last + self.cooldown,
                });
            }
        }

        let entry = LogEntry::at(name, now);
        sink.append(&entry)?;
        self.last_marked.insert(name.to_string(), now);
        tracing::info!(student = name, date = %entry.date, time = %entry.time, "attendance marked");
        Ok(MarkOutcome::Marked(entry))
    }

    pub fn last_marked(&self, name: &str) -> Option<DateTime<Local>> {
        self.last_marked.get(name).copied()
    }
}
