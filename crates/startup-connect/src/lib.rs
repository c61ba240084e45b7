//! Applicant accounting for the StartupConnect opportunity board.
//!
//! Applications are the source of truth; each opportunity carries a cached
//! `applicant_count` that is bumped after every submission and repaired by the
//! reconciler whenever it drifts.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
