//! State Aggregator: derives the application status from task facts and rules.
//!
//! This module is the single writer of [`StatusSnapshot`]. Every update
//! evaluates into a fresh snapshot and only replaces the stored one once the
//! whole evaluation has succeeded, so a failing matcher leaves the previous
//! snapshot authoritative.

use super::condition::ConditionMatcher;
use super::rules::{CustomStatusRule, RuleSet};
use super::types::{EvaluationContext, Severity, StatusSnapshot, TasksState};
use chrono::NaiveDateTime;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Message shown when no task is marked current.
pub const NO_CURRENT_TASK: &str = "(no current task)";

/// Default message derived from task facts when no custom rule matches.
#[must_use]
pub fn default_message(state: &TasksState) -> String {
    match state.number_marked_current {
        0 => NO_CURRENT_TASK.to_string(),
        1 => state.current_task_title.clone(),
        n => format!("({n} tasks marked current)"),
    }
}

struct Inner<C> {
    rules: RuleSet<C>,
    snapshot: StatusSnapshot,
}

/// Holds the latest [`StatusSnapshot`] and recomputes it on each update.
///
/// All methods take `&self`. Rules and snapshot share one lock that is held
/// for the whole evaluate-then-replace sequence: updates are serialized,
/// `configure` lands strictly between evaluations, and readers never see a
/// half-written snapshot.
pub struct StatusAggregator<M: ConditionMatcher> {
    matcher: M,
    inner: Mutex<Inner<M::Condition>>,
}

impl<M: ConditionMatcher> StatusAggregator<M> {
    #[must_use]
    pub fn new(matcher: M, rules: RuleSet<M::Condition>) -> Self {
        Self {
            matcher,
            inner: Mutex::new(Inner {
                rules,
                snapshot: StatusSnapshot::default(),
            }),
        }
    }

    /// Replaces the rule set. Takes effect on the next update.
    pub fn configure(&self, rules: RuleSet<M::Condition>) {
        self.lock().rules = rules;
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().snapshot.clone()
    }

    /// Recomputes the snapshot from fresh task facts.
    ///
    /// # Errors
    /// Returns the matcher's error; the stored snapshot is left unchanged.
    pub fn update_from_tasks_state(
        &self,
        state: &TasksState,
        now: NaiveDateTime,
    ) -> Result<(), M::Error> {
        let context = EvaluationContext::Tasks { state, now };
        let mut inner = self.lock();

        let (status, message) = match self.first_matching_rule(&inner.rules, &context)? {
            Some(rule) => (rule.resulting_status, rule.resulting_message.clone()),
            None => (Severity::Ok, default_message(state)),
        };
        let next = self.finish(&inner.rules, &context, status, message)?;

        inner.snapshot = next;
        Ok(())
    }

    /// Recomputes the snapshot after the task fetch failed.
    ///
    /// Custom status rules are skipped; nagging and downtime are still
    /// evaluated, with no task facts available to the matcher.
    ///
    /// # Errors
    /// Returns the matcher's error; the stored snapshot is left unchanged.
    pub fn update_from_task_state_error(
        &self,
        error_message: &str,
        now: NaiveDateTime,
    ) -> Result<(), M::Error> {
        let context = EvaluationContext::Error {
            message: error_message,
            now,
        };
        let mut inner = self.lock();

        let next = self.finish(
            &inner.rules,
            &context,
            Severity::Error,
            error_message.to_string(),
        )?;

        inner.snapshot = next;
        Ok(())
    }

    fn first_matching_rule<'r>(
        &self,
        rules: &'r RuleSet<M::Condition>,
        context: &EvaluationContext<'_>,
    ) -> Result<Option<&'r CustomStatusRule<M::Condition>>, M::Error> {
        for (index, rule) in rules.custom_state_rules.iter().enumerate() {
            if self.matcher.matches(&rule.condition, context)? {
                debug!(index, status = %rule.resulting_status, "custom status rule matched");
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }

    fn finish(
        &self,
        rules: &RuleSet<M::Condition>,
        context: &EvaluationContext<'_>,
        status: Severity,
        message: String,
    ) -> Result<StatusSnapshot, M::Error> {
        let downtime_enabled = self.any_matches(&rules.downtime_conditions, context)?;
        // Downtime suppresses nagging outright.
        let nagging_enabled =
            !downtime_enabled && self.any_matches(&rules.nagging_conditions, context)?;

        Ok(StatusSnapshot {
            status,
            message,
            nagging_enabled,
            downtime_enabled,
        })
    }

    fn any_matches(
        &self,
        conditions: &[M::Condition],
        context: &EvaluationContext<'_>,
    ) -> Result<bool, M::Error> {
        for condition in conditions {
            if self.matcher.matches(condition, context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<M::Condition>> {
        // The snapshot is only ever replaced whole, so a poisoned lock still
        // guards a consistent value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
