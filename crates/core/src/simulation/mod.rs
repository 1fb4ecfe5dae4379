//! Distributed step protocol
//!
//! One worker thread per region, one coordinator on the caller's thread.
//! Workers never see each other's cells; all exchange goes through the
//! coordinator's channels.

pub mod control;
pub mod coordinator;
pub mod transport;
pub mod worker;

// Re-export public types
pub use control::ControlHandle;
pub use coordinator::{
    Coordinator, CoordinatorState, FrameSink, RoundReport, RunSummary, StopReason,
};
pub use transport::{Broadcaster, Collection, Collector, Delivered, Signal, WorkerReport};
pub use worker::{spawn_worker, WorkerSetup};
