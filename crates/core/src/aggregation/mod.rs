//! Pure folds from fetched rows into display summaries.
//!
//! None of these functions perform I/O or read the clock; identical input
//! always produces identical output.

pub mod activity;
pub mod attendance;
pub mod finance;
pub mod grades;
pub mod system;
