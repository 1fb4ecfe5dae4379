//! Transition engine
//!
//! [`step_region`] is the only way region state moves forward. It is pure
//! apart from the generator it is handed.

pub mod rng;
pub mod transition;

// Re-exports
pub use rng::{row_rng, worker_rng};
pub use transition::{
    capped_ignition_probability, ignition_probability, ignition_severity, step_region,
    StepCounts, StepOutcome,
};
