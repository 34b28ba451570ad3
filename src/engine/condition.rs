//! Conditions and the matcher that evaluates them.
//!
//! The aggregator only knows the [`ConditionMatcher`] trait. [`StandardMatcher`]
//! is the implementation used by the CLI; it understands the [`Condition`]
//! enum that the TOML configuration deserializes into.

use super::types::{EvaluationContext, TasksState};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Answers "does this condition hold for this context?".
///
/// Implementations must not depend on aggregator state. Errors are passed
/// through the aggregator untouched.
pub trait ConditionMatcher {
    type Condition;
    type Error;

    /// Evaluates one condition against one context.
    ///
    /// # Errors
    /// Returns the matcher's error if the condition cannot be evaluated.
    fn matches(
        &self,
        condition: &Self::Condition,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, Self::Error>;
}

/// Failure to evaluate a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("unknown weekday '{0}', use mon/tue/wed/thu/fri/sat/sun")]
    InvalidWeekday(String),
}

/// Which overdue tasks an `overdue` condition counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueScope {
    #[default]
    Any,
    MarkedCurrent,
    NotMarkedCurrent,
}

fn default_at_least() -> u32 {
    1
}

/// A user-configured predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Always,
    Never,
    NoCurrentTask,
    MultipleCurrentTasks,
    CurrentTaskOverdue,
    CurrentTaskWithoutDate,
    CurrentTaskWithoutTime,
    /// At least `at_least` tasks with a due time in the past.
    Overdue {
        #[serde(default = "default_at_least")]
        at_least: u32,
        #[serde(default)]
        scope: OverdueScope,
    },
    /// Time of day in `[from, to)`, wrapping past midnight when `from > to`.
    /// Equal bounds cover the whole day. An empty `weekdays` list means
    /// every day; otherwise the day the window opened must be listed.
    TimeWindow {
        from: String,
        to: String,
        #[serde(default)]
        weekdays: Vec<String>,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Checks every time and weekday in this condition tree.
    ///
    /// The matcher only reports malformed values it actually reaches, so
    /// configuration checks call this up front.
    ///
    /// # Errors
    /// Returns the first malformed value found.
    pub fn validate(&self) -> Result<(), MatchError> {
        match self {
            Self::TimeWindow { from, to, weekdays } => {
                parse_time(from)?;
                parse_time(to)?;
                for day in weekdays {
                    parse_weekday(day)?;
                }
                Ok(())
            }
            Self::All { conditions } | Self::Any { conditions } => {
                conditions.iter().try_for_each(Condition::validate)
            }
            Self::Not { condition } => condition.validate(),
            _ => Ok(()),
        }
    }

    /// Returns true if evaluating this condition reads task facts.
    #[must_use]
    pub fn reads_tasks_state(&self) -> bool {
        match self {
            Self::Always | Self::Never | Self::TimeWindow { .. } => false,
            Self::All { conditions } | Self::Any { conditions } => {
                conditions.iter().any(Condition::reads_tasks_state)
            }
            Self::Not { condition } => condition.reads_tasks_state(),
            _ => true,
        }
    }
}

/// Matcher for [`Condition`].
///
/// In an error context there are no task facts: every leaf that reads
/// [`TasksState`] evaluates to `false` and only time-based leaves carry
/// information. Combinators apply normally on top of that.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMatcher;

impl StandardMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConditionMatcher for StandardMatcher {
    type Condition = Condition;
    type Error = MatchError;

    fn matches(
        &self,
        condition: &Condition,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, MatchError> {
        let state = context.tasks_state();
        let matched = match condition {
            Condition::Always => true,
            Condition::Never => false,
            Condition::NoCurrentTask => state.is_some_and(|s| s.number_marked_current == 0),
            Condition::MultipleCurrentTasks => {
                state.is_some_and(|s| s.number_marked_current > 1)
            }
            Condition::CurrentTaskOverdue => {
                single_current(state).is_some_and(|s| s.current_task_is_overdue)
            }
            Condition::CurrentTaskWithoutDate => {
                single_current(state).is_some_and(|s| !s.current_task_has_date)
            }
            Condition::CurrentTaskWithoutTime => {
                single_current(state).is_some_and(|s| !s.current_task_has_time)
            }
            Condition::Overdue { at_least, scope } => {
                state.is_some_and(|s| overdue_count(s, *scope) >= *at_least)
            }
            Condition::TimeWindow { from, to, weekdays } => {
                in_time_window(context.now(), from, to, weekdays)?
            }
            Condition::All { conditions } => {
                for sub in conditions {
                    if !self.matches(sub, context)? {
                        return Ok(false);
                    }
                }
                true
            }
            Condition::Any { conditions } => {
                for sub in conditions {
                    if self.matches(sub, context)? {
                        return Ok(true);
                    }
                }
                false
            }
            Condition::Not { condition } => !self.matches(condition, context)?,
        };
        Ok(matched)
    }
}

fn single_current(state: Option<&TasksState>) -> Option<&TasksState> {
    state.filter(|s| s.has_single_current())
}

fn overdue_count(state: &TasksState, scope: OverdueScope) -> u32 {
    match scope {
        OverdueScope::Any => state.number_overdue_with_time,
        OverdueScope::MarkedCurrent => state.number_overdue_with_time_marked_current,
        OverdueScope::NotMarkedCurrent => state.number_overdue_with_time_not_marked_current,
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, MatchError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| MatchError::InvalidTime(value.to_string()))
}

fn parse_weekday(value: &str) -> Result<Weekday, MatchError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| MatchError::InvalidWeekday(value.to_string()))
}

fn in_time_window(
    now: NaiveDateTime,
    from: &str,
    to: &str,
    weekdays: &[String],
) -> Result<bool, MatchError> {
    let from = parse_time(from)?;
    let to = parse_time(to)?;
    let time = now.time();

    // The day the window opened decides the weekday filter.
    let opened_on = if from == to {
        Some(now.date())
    } else if from < to {
        (from <= time && time < to).then(|| now.date())
    } else if time >= from {
        Some(now.date())
    } else if time < to {
        Some(now.date() - Duration::days(1))
    } else {
        None
    };

    let Some(day) = opened_on else {
        return Ok(false);
    };
    if weekdays.is_empty() {
        return Ok(true);
    }
    for name in weekdays {
        if parse_weekday(name)? == day.weekday() {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-03-04 is a Monday.
    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, min, 0))
            .expect("valid datetime")
    }

    fn window(from: &str, to: &str, weekdays: &[&str]) -> Condition {
        Condition::TimeWindow {
            from: from.to_string(),
            to: to.to_string(),
            weekdays: weekdays.iter().map(ToString::to_string).collect(),
        }
    }

    fn check(condition: &Condition, state: &TasksState, now: NaiveDateTime) -> bool {
        let ctx = EvaluationContext::Tasks { state, now };
        StandardMatcher.matches(condition, &ctx).expect("matcher succeeds")
    }

    fn one_current(title: &str) -> TasksState {
        TasksState {
            number_marked_current: 1,
            current_task_title: title.to_string(),
            ..TasksState::default()
        }
    }

    #[test]
    fn test_current_task_counts() {
        let now = at(4, 10, 0);
        let none = TasksState::default();
        let many = TasksState {
            number_marked_current: 3,
            ..TasksState::default()
        };

        assert!(check(&Condition::NoCurrentTask, &none, now));
        assert!(!check(&Condition::NoCurrentTask, &one_current("x"), now));
        assert!(check(&Condition::MultipleCurrentTasks, &many, now));
        assert!(!check(&Condition::MultipleCurrentTasks, &one_current("x"), now));
    }

    #[test]
    fn test_current_task_attributes_need_single_current() {
        let now = at(4, 10, 0);
        let single = TasksState {
            current_task_is_overdue: true,
            ..one_current("Pay rent")
        };
        let several = TasksState {
            number_marked_current: 2,
            current_task_is_overdue: true,
            ..TasksState::default()
        };

        assert!(check(&Condition::CurrentTaskOverdue, &single, now));
        assert!(!check(&Condition::CurrentTaskOverdue, &several, now));
        assert!(check(&Condition::CurrentTaskWithoutDate, &single, now));
        assert!(check(&Condition::CurrentTaskWithoutTime, &single, now));
        assert!(!check(&Condition::CurrentTaskWithoutDate, &several, now));
    }

    #[test]
    fn test_overdue_scopes() {
        let now = at(4, 10, 0);
        let state = TasksState {
            number_overdue_with_time: 3,
            number_overdue_with_time_marked_current: 1,
            number_overdue_with_time_not_marked_current: 2,
            ..TasksState::default()
        };
        let overdue = |at_least, scope| Condition::Overdue { at_least, scope };

        assert!(check(&overdue(3, OverdueScope::Any), &state, now));
        assert!(!check(&overdue(4, OverdueScope::Any), &state, now));
        assert!(check(&overdue(1, OverdueScope::MarkedCurrent), &state, now));
        assert!(!check(&overdue(2, OverdueScope::MarkedCurrent), &state, now));
        assert!(check(&overdue(2, OverdueScope::NotMarkedCurrent), &state, now));
    }

    #[test]
    fn test_time_window_same_day() {
        let state = TasksState::default();
        let office = window("09:00", "17:00", &[]);
        assert!(check(&office, &state, at(4, 9, 0)));
        assert!(check(&office, &state, at(4, 16, 59)));
        assert!(!check(&office, &state, at(4, 17, 0)));
        assert!(!check(&office, &state, at(4, 8, 59)));
    }

    #[test]
    fn test_time_window_wraps_midnight() {
        let state = TasksState::default();
        let night = window("22:00", "06:00", &[]);
        assert!(check(&night, &state, at(4, 23, 30)));
        assert!(check(&night, &state, at(5, 2, 0)));
        assert!(!check(&night, &state, at(5, 6, 0)));
        assert!(!check(&night, &state, at(5, 12, 0)));
    }

    #[test]
    fn test_time_window_weekdays_use_opening_day() {
        let state = TasksState::default();
        // Friday night into Saturday morning.
        let friday_night = window("22:00", "06:00", &["fri"]);
        assert!(check(&friday_night, &state, at(8, 23, 0)));
        assert!(check(&friday_night, &state, at(9, 3, 0)));
        assert!(!check(&friday_night, &state, at(9, 23, 0)));

        let weekend = window("00:00", "00:00", &["saturday", "Sun"]);
        assert!(check(&weekend, &state, at(9, 12, 0)));
        assert!(check(&weekend, &state, at(10, 12, 0)));
        assert!(!check(&weekend, &state, at(4, 12, 0)));
    }

    #[test]
    fn test_combinators() {
        let now = at(4, 10, 0);
        let state = TasksState::default();
        let all = Condition::All {
            conditions: vec![Condition::Always, Condition::NoCurrentTask],
        };
        let any = Condition::Any {
            conditions: vec![Condition::Never, Condition::MultipleCurrentTasks],
        };
        let not = Condition::Not {
            condition: Box::new(Condition::Never),
        };

        assert!(check(&all, &state, now));
        assert!(!check(&any, &state, now));
        assert!(check(&not, &state, now));
        assert!(check(&Condition::All { conditions: vec![] }, &state, now));
        assert!(!check(&Condition::Any { conditions: vec![] }, &state, now));
    }

    #[test]
    fn test_error_context_only_time_leaves_match() {
        let now = at(4, 10, 0);
        let ctx = EvaluationContext::Error {
            message: "fetch failed",
            now,
        };
        let matcher = StandardMatcher::new();

        assert_eq!(matcher.matches(&Condition::NoCurrentTask, &ctx), Ok(false));
        assert_eq!(
            matcher.matches(&window("09:00", "17:00", &[]), &ctx),
            Ok(true)
        );
        let negated = Condition::Not {
            condition: Box::new(Condition::NoCurrentTask),
        };
        assert_eq!(matcher.matches(&negated, &ctx), Ok(true));
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let state = TasksState::default();
        let ctx = EvaluationContext::Tasks {
            state: &state,
            now: at(4, 10, 0),
        };
        assert_eq!(
            StandardMatcher.matches(&window("9am", "17:00", &[]), &ctx),
            Err(MatchError::InvalidTime("9am".to_string()))
        );
        assert_eq!(
            StandardMatcher.matches(&window("09:00", "17:00", &["someday"]), &ctx),
            Err(MatchError::InvalidWeekday("someday".to_string()))
        );
    }

    #[test]
    fn test_validate_walks_nested_conditions() {
        let nested = Condition::Any {
            conditions: vec![
                Condition::Always,
                Condition::Not {
                    condition: Box::new(window("25:00", "06:00", &[])),
                },
            ],
        };
        assert!(matches!(nested.validate(), Err(MatchError::InvalidTime(_))));
        assert!(window("08:00", "09:30", &["mon"]).validate().is_ok());
    }

    #[test]
    fn test_reads_tasks_state() {
        assert!(!window("08:00", "09:00", &[]).reads_tasks_state());
        assert!(Condition::Not {
            condition: Box::new(Condition::NoCurrentTask)
        }
        .reads_tasks_state());
    }

    #[test]
    fn test_deserialize_tagged_conditions() {
        let toml_str = r#"
            kind = "all"
            conditions = [
                { kind = "overdue" },
                { kind = "time_window", from = "09:00", to = "17:00", weekdays = ["mon"] },
                { kind = "not", condition = { kind = "no_current_task" } },
            ]
        "#;
        let condition: Condition = toml::from_str(toml_str).expect("parse");
        let Condition::All { conditions } = condition else {
            panic!("expected all");
        };
        assert_eq!(
            conditions[0],
            Condition::Overdue {
                at_least: 1,
                scope: OverdueScope::Any
            }
        );
        assert_eq!(conditions[1], window("09:00", "17:00", &["mon"]));
    }
}
