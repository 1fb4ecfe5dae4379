//! Error taxonomy for the partitioned fire simulation
//!
//! Configuration errors are fatal at startup. Runtime errors raised inside a
//! worker end that worker only; the coordinator logs them and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type SimResult<T> = Result<T, SimError>;

/// Every failure the simulation can report
#[derive(Debug, Error)]
pub enum SimError {
    /// Worker count of zero (or above the supported maximum)
    #[error("worker count {count} is invalid (supported range 1..={max})")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Worker index outside `[0, worker_count)`
    #[error("worker index {index} is out of range for {count} workers")]
    InvalidWorkerIndex { index: usize, count: usize },

    /// A configuration value failed validation
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Partition left a cell uncovered
    #[error("partition leaves cell ({row}, {col}) uncovered")]
    PartitionGap { row: usize, col: usize },

    /// Partition assigned a cell to more than one region
    #[error("partition assigns cell ({row}, {col}) to more than one region")]
    PartitionOverlap { row: usize, col: usize },

    /// Unknown compass direction string
    #[error("unknown wind direction '{0}' (expected N, NE, E, SE, S, SW, W or NW)")]
    InvalidWindDirection(String),

    /// Unknown fire model string
    #[error("unknown fire model '{0}' (expected 'intensity' or 'owned')")]
    InvalidFireModel(String),

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Region fields disagree with the region bounds
    #[error("malformed region for worker {worker}: {reason}")]
    MalformedRegion { worker: u16, reason: String },

    /// Worker thread could not be started
    #[error("failed to spawn worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    /// Worker did not deliver its initial region
    #[error("worker {worker} failed during startup: {reason}")]
    WorkerStartup { worker: usize, reason: String },

    /// Regions handed to reassembly do not tile the grid
    #[error("global grid assembly failed: {0}")]
    Assembly(String),

    /// Round requested after shutdown
    #[error("coordinator has already shut down")]
    Terminated,
}

impl SimError {
    /// Shorthand for a configuration validation failure
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the fatal-at-startup class
    ///
    /// Covers bad configuration and workers that never came up.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidWorkerCount { .. }
                | Self::InvalidWorkerIndex { .. }
                | Self::InvalidConfig { .. }
                | Self::PartitionGap { .. }
                | Self::PartitionOverlap { .. }
                | Self::InvalidWindDirection(_)
                | Self::InvalidFireModel(_)
                | Self::ConfigIo { .. }
                | Self::ConfigParse { .. }
                | Self::WorkerSpawn { .. }
                | Self::WorkerStartup { .. }
        )
    }
}
