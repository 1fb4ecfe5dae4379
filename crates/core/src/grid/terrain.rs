//! Random initial landscape for one region
//!
//! Every field is sampled independently per cell; there is no spatial
//! correlation. Distribution parameters come from [`TerrainParams`].

use super::partition::RegionBounds;
use super::region::{Region, TerrainFields};
use crate::config::{FireModel, FuelWeights, SpreadParams, TerrainParams};
use crate::core_types::{Cell, FireIntensity, FuelAge, OwnerId};
use crate::error::{SimError, SimResult};
use crate::Field;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use tracing::info;

/// Result of fire seeding
///
/// `created` can be lower than `target`: trials that land on non-flammable
/// cells are skipped, not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FireSeeding {
    pub target: u32,
    pub created: u32,
}

/// Initial cell states, in the order of the [`FuelWeights`] fields
const CATEGORIES: [Cell; 5] = [
    Cell::Tree(FuelAge::Young),
    Cell::Tree(FuelAge::Mature),
    Cell::Tree(FuelAge::Old),
    Cell::Empty,
    Cell::Water,
];

/// Categorical draw of initial cell states, built once per terrain
#[derive(Debug, Clone)]
pub struct CellSampler {
    index: WeightedIndex<f32>,
}

impl CellSampler {
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if a weight is negative or not finite, or
    /// all weights are zero
    pub fn new(weights: &FuelWeights) -> SimResult<Self> {
        let index = WeightedIndex::new([
            weights.young,
            weights.mature,
            weights.old,
            weights.empty,
            weights.water,
        ])
        .map_err(|e| SimError::invalid_config("terrain.fuel_weights", e.to_string()))?;
        Ok(Self { index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        CATEGORIES[self.index.sample(rng)]
    }
}

/// Generate the state, elevation, humidity and temperature fields of a region
///
/// # Arguments
///
/// * `bounds` - Region rectangle in global coordinates
/// * `owner_id` - Worker that will own the region
/// * `params` - Distribution parameters
/// * `rng` - Random source
///
/// # Errors
///
/// [`SimError::InvalidConfig`] if the fuel weights cannot be sampled, or
/// [`SimError::MalformedRegion`] if the generated fields disagree with
/// `bounds`
pub fn generate_terrain<R: Rng + ?Sized>(
    bounds: RegionBounds,
    owner_id: OwnerId,
    params: &TerrainParams,
    rng: &mut R,
) -> SimResult<Region> {
    let (rows, cols) = (bounds.rows(), bounds.cols());
    info!(
        "Worker {}: generating terrain {}x{} cells at rows {}..{}, cols {}..{}",
        owner_id, rows, cols, bounds.row_start, bounds.row_end, bounds.col_start, bounds.col_end
    );

    let sampler = CellSampler::new(&params.fuel_weights)?;
    let cells = Field::from_fn(rows, cols, |_, _| sampler.sample(rng));
    let elevation = Field::from_fn(rows, cols, |_, _| params.elevation.sample(rng));
    let humidity = Field::from_fn(rows, cols, |_, _| params.humidity.sample(rng));
    let temperature = Field::from_fn(rows, cols, |_, _| params.temperature.sample(rng));

    let region = Region::new(
        bounds,
        owner_id,
        cells,
        TerrainFields {
            elevation,
            humidity,
            temperature,
        },
    )?;

    info!("Worker {}: terrain generated", owner_id);
    Ok(region)
}

/// Seed initial fires in place
///
/// Draws a trial count from `params.initial_fires`; each trial picks a
/// uniformly random cell and ignites it only if it holds a tree. Intensity
/// fires get a random level, owned fires the region's owner id.
pub fn initialize_fires<R: Rng + ?Sized>(
    region: &mut Region,
    params: &SpreadParams,
    rng: &mut R,
) -> FireSeeding {
    let range = params.initial_fires;
    let target = rng.random_range(range.min..=range.max);
    let mut created = 0;

    let (rows, cols) = (region.rows(), region.cols());
    if rows == 0 || cols == 0 {
        return FireSeeding { target, created };
    }

    for _ in 0..target {
        let row = rng.random_range(0..rows);
        let col = rng.random_range(0..cols);
        if !region.cell(row, col).is_flammable() {
            continue;
        }
        let fire = match params.model {
            FireModel::Intensity => Cell::Fire(FireIntensity::ALL[rng.random_range(0..3)]),
            FireModel::Owned => Cell::OwnedFire(region.owner_id),
        };
        region.set_cell(row, col, fire);
        created += 1;
    }

    info!(
        "Worker {}: initialized {} fire(s) out of {} trial(s)",
        region.owner_id, created, target
    );
    FireSeeding { target, created }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fields_within_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = TerrainParams::default();
        let region = generate_terrain(RegionBounds::new(5, 25, 10, 40), 3, &params, &mut rng).unwrap();

        assert_eq!((region.rows(), region.cols()), (20, 30));
        assert!(region.owners.as_slice().iter().all(|&o| o == 3));
        assert!(region
            .terrain
            .elevation
            .as_slice()
            .iter()
            .all(|&e| (0.0..100.0).contains(&e)));
        assert!(region
            .terrain
            .humidity
            .as_slice()
            .iter()
            .all(|&h| (0.3..0.9).contains(&h)));
        assert!(region
            .terrain
            .temperature
            .as_slice()
            .iter()
            .all(|&t| (20.0..35.0).contains(&t)));
        assert_eq!(region.burning_cells(), 0);
    }

    #[test]
    fn test_state_distribution_matches_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let sampler = CellSampler::new(&FuelWeights::default()).unwrap();
        let n = 100_000;
        let mut counts = [0_usize; 10];
        for _ in 0..n {
            counts[usize::from(sampler.sample(&mut rng).code())] += 1;
        }
        let share = |code: u8| counts[usize::from(code)] as f32 / n as f32;
        assert!((share(Cell::TREE_YOUNG) - 0.30).abs() < 0.01);
        assert!((share(Cell::TREE_MATURE) - 0.40).abs() < 0.01);
        assert!((share(Cell::TREE_OLD) - 0.20).abs() < 0.01);
        assert!((share(Cell::EMPTY) - 0.08).abs() < 0.01);
        assert!((share(Cell::WATER) - 0.02).abs() < 0.005);
        let burning: usize = counts[4..=8].iter().sum();
        assert_eq!(burning, 0);
    }

    #[test]
    fn test_zero_weight_category_never_drawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sampler = CellSampler::new(&FuelWeights {
            young: 0.0,
            mature: 1.0,
            old: 0.0,
            empty: 0.0,
            water: 0.0,
        })
        .unwrap();
        for _ in 0..1_000 {
            assert_eq!(sampler.sample(&mut rng), Cell::Tree(FuelAge::Mature));
        }
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let weights = FuelWeights {
            young: 0.0,
            mature: 0.0,
            old: 0.0,
            empty: 0.0,
            water: 0.0,
        };
        let err = CellSampler::new(&weights).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidConfig {
                field: "terrain.fuel_weights",
                ..
            }
        ));
    }

    #[test]
    fn test_seeding_skips_non_flammable_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut region = Region::uniform(RegionBounds::full(8, 8), 0, Cell::Water, 0.0, 0.5, 25.0);
        let seeding = initialize_fires(&mut region, &SpreadParams::intensity(), &mut rng);
        assert!((2..=5).contains(&seeding.target));
        assert_eq!(seeding.created, 0);
        assert_eq!(region.burning_cells(), 0);
    }

    #[test]
    fn test_seeding_intensity_fires() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut region = Region::uniform(
            RegionBounds::full(50, 50),
            0,
            Cell::Tree(FuelAge::Mature),
            0.0,
            0.5,
            25.0,
        );
        let seeding = initialize_fires(&mut region, &SpreadParams::intensity(), &mut rng);
        assert!(seeding.created >= 1 && seeding.created <= seeding.target);
        // A repeat hit finds fire, not fuel, and is skipped
        assert_eq!(region.burning_cells(), seeding.created as usize);
        assert_eq!(region.count(|c| matches!(c, Cell::OwnedFire(_))), 0);
    }

    #[test]
    fn test_seeding_owned_fires_carry_owner() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut region = Region::uniform(
            RegionBounds::full(50, 50),
            7,
            Cell::Tree(FuelAge::Old),
            0.0,
            0.5,
            25.0,
        );
        let seeding = initialize_fires(&mut region, &SpreadParams::owned(), &mut rng);
        assert!((1..=3).contains(&seeding.target));
        assert!(seeding.created >= 1);
        assert!(region
            .cells
            .as_slice()
            .iter()
            .filter(|c| c.is_burning())
            .all(|&c| c == Cell::OwnedFire(7)));
    }
}
