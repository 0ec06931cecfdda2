//! Sales dashboard aggregation engine.
//!
//! Loads a wide scenario table (one row per Scenario, business unit, Account
//! and Year, one column per month), derives the three dashboard summaries and
//! assembles a renderer-neutral dashboard document from them.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod load;
pub mod summary;
