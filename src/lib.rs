//! Agent-based simulation of an influenza outbreak in a school.
//!
//! Every episode builds a fresh population, seeds patient zero, and steps
//! through the configured days with all-pairs encounters on contact days.
//! Many independent episodes are aggregated into expected-value statistics.

pub mod config;
pub mod engine;
pub mod manager;
pub mod model;
pub mod population;
pub mod schedule;
pub mod stats;
