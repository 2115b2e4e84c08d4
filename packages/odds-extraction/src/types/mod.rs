//! Data types for extraction targets, outcomes, and configuration.

pub mod config;
pub mod outcome;
pub mod target;
