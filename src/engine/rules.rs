//! Rule set configuration consumed by the aggregator.

use super::condition::Condition;
use super::types::Severity;
use serde::{Deserialize, Serialize};

/// Replaces the default status and message when its condition matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStatusRule<C = Condition> {
    pub condition: C,
    pub resulting_status: Severity,
    pub resulting_message: String,
}

impl<C> CustomStatusRule<C> {
    #[must_use]
    pub fn new(condition: C, resulting_status: Severity, resulting_message: &str) -> Self {
        Self {
            condition,
            resulting_status,
            resulting_message: resulting_message.to_string(),
        }
    }
}

/// Ordered rules evaluated on every update. All lists default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet<C = Condition> {
    /// First match wins.
    #[serde(default = "Vec::new")]
    pub custom_state_rules: Vec<CustomStatusRule<C>>,
    #[serde(default = "Vec::new")]
    pub nagging_conditions: Vec<C>,
    #[serde(default = "Vec::new")]
    pub downtime_conditions: Vec<C>,
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self {
            custom_state_rules: Vec::new(),
            nagging_conditions: Vec::new(),
            downtime_conditions: Vec::new(),
        }
    }
}

impl<C> RuleSet<C> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.custom_state_rules.is_empty()
            && self.nagging_conditions.is_empty()
            && self.downtime_conditions.is_empty()
    }
}
