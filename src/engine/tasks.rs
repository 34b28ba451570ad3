//! Task summaries: derives [`TasksState`] from a provider-neutral task list.

use super::types::TasksState;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One task as reported by a provider, reduced to what the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub title: String,
    #[serde(default)]
    pub marked_current: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Only meaningful together with `due_date`.
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
}

impl TaskSummary {
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            marked_current: false,
            due_date: None,
            due_time: None,
        }
    }

    #[must_use]
    pub fn current(mut self) -> Self {
        self.marked_current = true;
        self
    }

    #[must_use]
    pub fn due(mut self, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        self.due_date = Some(date);
        self.due_time = time;
        self
    }

    /// Has a due date and time, and that moment has passed.
    #[must_use]
    pub fn is_overdue_with_time(&self, now: NaiveDateTime) -> bool {
        match (self.due_date, self.due_time) {
            (Some(date), Some(time)) => date.and_time(time) < now,
            _ => false,
        }
    }

    /// Overdue with time, or date-only and due before today.
    #[must_use]
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match (self.due_date, self.due_time) {
            (Some(_), Some(_)) => self.is_overdue_with_time(now),
            (Some(date), None) => date < now.date(),
            _ => false,
        }
    }
}

/// JSON document read by the `eval` and `watch` commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
}

impl TaskFile {
    /// Reads and parses a task file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read task file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid task file {}", path.display()))
    }
}

impl TasksState {
    /// Counts the facts the status rules look at.
    #[must_use]
    pub fn from_tasks(tasks: &[TaskSummary], now: NaiveDateTime) -> Self {
        let mut state = TasksState::default();
        let mut current = None;

        for task in tasks {
            if task.is_overdue_with_time(now) {
                state.number_overdue_with_time += 1;
                if task.marked_current {
                    state.number_overdue_with_time_marked_current += 1;
                } else {
                    state.number_overdue_with_time_not_marked_current += 1;
                }
            }
            if task.marked_current {
                state.number_marked_current += 1;
                current = Some(task);
            }
        }

        if let (1, Some(task)) = (state.number_marked_current, current) {
            state.current_task_title = task.title.clone();
            state.current_task_has_date = task.due_date.is_some();
            state.current_task_has_time = task.due_date.is_some() && task.due_time.is_some();
            state.current_task_is_overdue = task.is_overdue(now);
        }
        state
    }
}
