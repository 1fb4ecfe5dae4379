//! Grid-level modules: partitioning, regions, terrain, reassembly

pub mod global;
pub mod partition;
pub mod region;
pub mod terrain;

// Re-export main types
pub use global::{FireStats, GlobalGrid};
pub use partition::{partition, partition_all, verify_coverage, RegionBounds};
pub use region::{Region, TerrainFields};
pub use terrain::{generate_terrain, initialize_fires, CellSampler, FireSeeding};
