//! Stochastic transition rule
//!
//! Advances one region by one step. The input region is never modified;
//! a fresh cells/owners buffer is built from it, row by row in parallel.
//!
//! # Per-cell rule
//!
//! ```text
//! Fire     -> Burned            with p_extinguish
//!          -> one level hotter  if the same draw is below intensify_threshold
//! Burned   -> Ash               with p_ash
//! Tree     -> Fire              with min(sum over burning neighbors, cap)
//! Empty, Water, Ash             unchanged
//! ```
//!
//! A burning neighbor contributes
//! `base * wind * elevation * humidity * temperature * fuel`; only the eight
//! Moore neighbors inside the region are read.
//!
//! Extinguishing is checked before intensifying on one shared draw, so
//! intensifying can only happen when `intensify_threshold` is above
//! `extinguish_probability`. With the default 0.10 and 0.05 a fire never
//! intensifies.

use super::rng::row_rng;
use crate::config::{FireModel, SpreadParams};
use crate::core_types::{Cell, FireIntensity, OwnerId, Wind};
use crate::error::SimResult;
use crate::grid::Region;
use rand::Rng;
use rayon::prelude::*;
use std::ops::{Add, AddAssign};
use std::sync::Arc;
use tracing::{debug, info};

/// Moore neighborhood offsets `(dr, dc)` from the target cell
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// State changes counted during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCounts {
    pub ignited: u32,
    pub extinguished: u32,
    pub intensified: u32,
    pub ashed: u32,
}

impl StepCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for StepCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ignited: self.ignited + rhs.ignited,
            extinguished: self.extinguished + rhs.extinguished,
            intensified: self.intensified + rhs.intensified,
            ashed: self.ashed + rhs.ashed,
        }
    }
}

impl AddAssign for StepCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// New region plus what changed
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub region: Region,
    pub counts: StepCounts,
}

/// Spread contribution base of `neighbor` onto a cell owned by `owner`
///
/// `None` when the neighbor cannot spread fire under the active model.
fn neighbor_base(neighbor: Cell, owner: OwnerId, params: &SpreadParams) -> Option<f32> {
    let base = &params.base_probability;
    match (params.model, neighbor) {
        (FireModel::Intensity, Cell::Fire(intensity)) => Some(match intensity {
            FireIntensity::Low => base.low,
            FireIntensity::Medium => base.medium,
            FireIntensity::High => base.high,
        }),
        (FireModel::Owned, Cell::OwnedFire(fire_owner)) if fire_owner == owner => Some(base.owned),
        _ => None,
    }
}

/// Uncapped ignition probability of the cell at local `(row, col)`
///
/// Zero for anything that is not a tree.
pub fn ignition_probability(
    region: &Region,
    row: usize,
    col: usize,
    wind: &Wind,
    params: &SpreadParams,
) -> f32 {
    let Cell::Tree(age) = region.cell(row, col) else {
        return 0.0;
    };

    let owner = region.owners.get(row, col);
    let elevation = region.elevation(row, col);
    let humidity_factor = 1.0 - region.humidity(row, col);
    let temperature_factor =
        1.0 + (region.temperature(row, col) - params.base_temperature) * params.temperature_gain;
    let fuel_factor = params.fuel_factor.for_age(age);
    let local = humidity_factor * temperature_factor * fuel_factor;

    let (rows, cols) = (region.rows() as i64, region.cols() as i64);
    let mut total = 0.0;
    for (dr, dc) in NEIGHBORS {
        let nr = row as i64 + i64::from(dr);
        let nc = col as i64 + i64::from(dc);
        if nr < 0 || nc < 0 || nr >= rows || nc >= cols {
            continue;
        }
        let (nr, nc) = (nr as usize, nc as usize);
        let Some(base) = neighbor_base(region.cell(nr, nc), owner, params) else {
            continue;
        };

        let wind_factor = wind.factor(dr, dc, params.wind_with_gain, params.wind_against_damping);
        let elevation_factor = if region.elevation(nr, nc) < elevation {
            1.0 + params.elevation_factor
        } else {
            1.0 - 0.5 * params.elevation_factor
        };
        total += base * wind_factor * elevation_factor * local;
    }
    total
}

/// Ignition probability clamped to the model's cap
pub fn capped_ignition_probability(
    region: &Region,
    row: usize,
    col: usize,
    wind: &Wind,
    params: &SpreadParams,
) -> f32 {
    ignition_probability(region, row, col, wind, params).min(params.ignition_cap)
}

/// Intensity of a freshly ignited cell under local conditions
pub fn ignition_severity(temperature: f32, humidity: f32, params: &SpreadParams) -> FireIntensity {
    let s = &params.severity;
    if temperature > s.high_temperature && humidity < s.high_humidity {
        FireIntensity::High
    } else if temperature > s.medium_temperature && humidity < s.medium_humidity {
        FireIntensity::Medium
    } else {
        FireIntensity::Low
    }
}

/// Next state of one cell; updates `counts`
fn next_cell<R: Rng + ?Sized>(
    region: &Region,
    row: usize,
    col: usize,
    wind: &Wind,
    params: &SpreadParams,
    rng: &mut R,
    counts: &mut StepCounts,
) -> Cell {
    let cell = region.cell(row, col);
    match cell {
        Cell::Fire(intensity) => {
            let u: f32 = rng.random();
            if u < params.extinguish_probability {
                counts.extinguished += 1;
                Cell::Burned
            } else if params.model == FireModel::Intensity
                && u < params.intensify_threshold
                && intensity < FireIntensity::High
            {
                counts.intensified += 1;
                Cell::Fire(intensity.intensified())
            } else {
                cell
            }
        }
        Cell::OwnedFire(_) => {
            let u: f32 = rng.random();
            if u < params.extinguish_probability {
                counts.extinguished += 1;
                Cell::Burned
            } else {
                cell
            }
        }
        Cell::Burned => {
            let u: f32 = rng.random();
            if u < params.ash_probability {
                counts.ashed += 1;
                Cell::Ash
            } else {
                cell
            }
        }
        Cell::Tree(_) => {
            let p = capped_ignition_probability(region, row, col, wind, params);
            let u: f32 = rng.random();
            if u >= p {
                return cell;
            }
            counts.ignited += 1;
            match params.model {
                FireModel::Intensity => Cell::Fire(ignition_severity(
                    region.temperature(row, col),
                    region.humidity(row, col),
                    params,
                )),
                FireModel::Owned => Cell::OwnedFire(region.owners.get(row, col)),
            }
        }
        Cell::Empty | Cell::Water | Cell::Ash => cell,
    }
}

/// Advance `region` one step
///
/// Draws a single step seed from `rng`; each row then uses its own stream
/// derived from it, so the result is identical whatever order rayon runs
/// the rows in.
///
/// # Arguments
///
/// * `region` - Current state (not modified)
/// * `wind` - Run-wide wind
/// * `params` - Transition parameters and fire model
/// * `step` - Step being computed, for logging
/// * `rng` - Worker generator
///
/// # Errors
///
/// [`crate::SimError::MalformedRegion`] if the region's fields disagree
/// with its bounds
pub fn step_region<R: Rng + ?Sized>(
    region: &Region,
    wind: &Wind,
    params: &SpreadParams,
    step: u64,
    rng: &mut R,
) -> SimResult<StepOutcome> {
    region.validate()?;

    let step_seed: u64 = rng.random();
    let cols = region.cols();
    let mut cells = region.cells.clone();
    let mut owners = region.owners.clone();

    if cells.is_empty() || cols == 0 {
        return Ok(StepOutcome {
            region: region.clone(),
            counts: StepCounts::default(),
        });
    }

    let counts = cells
        .as_mut_slice()
        .par_chunks_mut(cols)
        .zip(owners.as_mut_slice().par_chunks_mut(cols))
        .enumerate()
        .map(|(row, (cell_row, owner_row))| {
            let mut rng = row_rng(step_seed, row);
            let mut counts = StepCounts::default();
            for (col, (cell, owner)) in cell_row.iter_mut().zip(owner_row.iter_mut()).enumerate() {
                let next = next_cell(region, row, col, wind, params, &mut rng, &mut counts);
                if let Cell::OwnedFire(fire_owner) = next {
                    *owner = fire_owner;
                }
                *cell = next;
            }
            counts
        })
        .reduce(StepCounts::default, |a, b| a + b);

    if counts.is_empty() {
        debug!("Worker {}: step {}: no state changes", region.owner_id, step);
    } else {
        info!(
            "Worker {}: step {}: {} ignited, {} extinguished, {} intensified, {} turned to ash",
            region.owner_id,
            step,
            counts.ignited,
            counts.extinguished,
            counts.intensified,
            counts.ashed
        );
    }

    Ok(StepOutcome {
        region: Region {
            bounds: region.bounds,
            owner_id: region.owner_id,
            cells,
            owners,
            terrain: Arc::clone(&region.terrain),
        },
        counts,
    })
}
