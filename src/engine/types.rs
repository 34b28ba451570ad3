//! Core types for the status engine.
//!
//! Note: the aggregation logic lives in `aggregator.rs`. Everything here is
//! plain data passed in and out of it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity of the derived status.
///
/// There is no ranking between variants: the aggregator adopts whichever
/// severity the first matching rule names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Accepts both the stored form (`WARNING`) and the config form (`warning`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Facts about the task universe at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksState {
    pub number_overdue_with_time: u32,
    pub number_overdue_with_time_marked_current: u32,
    pub number_overdue_with_time_not_marked_current: u32,
    pub number_marked_current: u32,
    /// Only meaningful when exactly one task is marked current.
    pub current_task_title: String,
    pub current_task_has_date: bool,
    pub current_task_has_time: bool,
    pub current_task_is_overdue: bool,
}

impl TasksState {
    /// Returns true when exactly one task is marked current.
    #[must_use]
    pub fn has_single_current(&self) -> bool {
        self.number_marked_current == 1
    }
}

/// Input to one evaluation: either fresh task facts or an upstream error.
#[derive(Debug, Clone, Copy)]
pub enum EvaluationContext<'a> {
    Tasks {
        state: &'a TasksState,
        now: NaiveDateTime,
    },
    Error {
        message: &'a str,
        now: NaiveDateTime,
    },
}

impl<'a> EvaluationContext<'a> {
    /// Local wall-clock time of the evaluation.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::Tasks { now, .. } | Self::Error { now, .. } => *now,
        }
    }

    /// The task facts, if this is not an error evaluation.
    #[must_use]
    pub fn tasks_state(&self) -> Option<&'a TasksState> {
        match self {
            Self::Tasks { state, .. } => Some(*state),
            Self::Error { .. } => None,
        }
    }
}

/// The aggregator's fully computed output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: Severity,
    pub message: String,
    pub nagging_enabled: bool,
    pub downtime_enabled: bool,
}

/// Direction of a flag change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

impl Transition {
    fn between(before: bool, after: bool) -> Option<Self> {
        match (before, after) {
            (false, true) => Some(Self::Started),
            (true, false) => Some(Self::Stopped),
            _ => None,
        }
    }
}

/// What differs between two consecutive snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotChange {
    pub status_changed: bool,
    pub message_changed: bool,
    pub nagging: Option<Transition>,
    pub downtime: Option<Transition>,
}

impl SnapshotChange {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.status_changed
            && !self.message_changed
            && self.nagging.is_none()
            && self.downtime.is_none()
    }
}

impl StatusSnapshot {
    /// Compares this snapshot against the one it replaced.
    #[must_use]
    pub fn changes_from(&self, previous: &StatusSnapshot) -> SnapshotChange {
        SnapshotChange {
            status_changed: self.status != previous.status,
            message_changed: self.message != previous.message,
            nagging: Transition::between(previous.nagging_enabled, self.nagging_enabled),
            downtime: Transition::between(previous.downtime_enabled, self.downtime_enabled),
        }
    }
}
