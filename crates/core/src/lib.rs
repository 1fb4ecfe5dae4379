//! Partitioned wildfire cellular automaton
//!
//! A 2-D landscape of trees, water and bare ground is split into disjoint
//! rectangular regions, one per worker thread. Every step each worker
//! advances its region with a stochastic transition rule (neighbor fire,
//! wind, slope, humidity, temperature and fuel age feed an ignition
//! probability), and a coordinator stitches the regions back into one
//! global grid.
//!
//! ## Fire models
//!
//! - **Intensity**: shared fire graded Low/Medium/High; any burning
//!   neighbor can spread it.
//! - **Owned**: fire tagged with the worker that lit it; it spreads only to
//!   cells with the same owner.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wildfire_ca_core::{Coordinator, RoundReport, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     workers: 4,
//!     max_steps: 100,
//!     ..SimulationConfig::default()
//! };
//! let mut coordinator = Coordinator::spawn(config)?;
//! let summary = coordinator.run(&mut |report: &RoundReport| {
//!     println!("step {}: {} burning", report.step, report.stats.fires);
//! })?;
//! println!("{:?}", summary.reason);
//! # Ok::<(), wildfire_ca_core::SimError>(())
//! ```

// Core types
pub mod core_types;

pub mod config;
pub mod error;

// Regions and the global grid
pub mod grid;

// Transition engine
pub mod solver;

// Coordinator and workers
pub mod simulation;

// Re-export core types
pub use core_types::{Cell, Field, FireIntensity, FuelAge, OwnerId, Wind, WindDirection};

pub use config::{
    BaseProbability, FireCountRange, FireModel, FuelFactors, FuelWeights, SeverityThresholds,
    SimulationConfig, SpreadParams, TerrainParams, UniformRange, MAX_WORKERS,
};
pub use error::{SimError, SimResult};

pub use grid::{
    generate_terrain, initialize_fires, partition, partition_all, verify_coverage, CellSampler,
    FireSeeding, FireStats, GlobalGrid, Region, RegionBounds, TerrainFields,
};

pub use solver::{
    capped_ignition_probability, ignition_probability, step_region, StepCounts, StepOutcome,
};

pub use simulation::{
    ControlHandle, Coordinator, CoordinatorState, FrameSink, RoundReport, RunSummary, StopReason,
};
