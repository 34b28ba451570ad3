//! nudge: derives the current-task status, nagging and downtime flags from
//! task facts and user rules.

pub mod engine;

pub use engine::aggregator::StatusAggregator;
pub use engine::condition::{Condition, ConditionMatcher, MatchError, StandardMatcher};
pub use engine::rules::{CustomStatusRule, RuleSet};
pub use engine::types::{EvaluationContext, Severity, StatusSnapshot, TasksState};
