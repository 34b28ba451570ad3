//! Core engine modules for nudge.

pub mod aggregator;
pub mod condition;
pub mod config;
pub mod db;
pub mod history;
pub mod rules;
pub mod tasks;
pub mod types;
