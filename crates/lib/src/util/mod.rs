//! Shared utilities.
//!
//! Serde helpers for human-readable durations and test helpers.

pub mod duration;

#[cfg(test)]
pub mod testutil;
