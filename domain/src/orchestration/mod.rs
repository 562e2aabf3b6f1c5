//! Session orchestration domain
//!
//! The fixed phase table and the facilitation strategy that schedules it.

pub mod phase;
pub mod strategy;
