//! Worker thread: owns one region and advances it on command

use super::transport::{Signal, WorkerReport};
use crate::config::{SpreadParams, TerrainParams};
use crate::core_types::{OwnerId, Wind};
use crate::error::{SimError, SimResult};
use crate::grid::{generate_terrain, initialize_fires, Region, RegionBounds};
use crate::solver::{step_region, worker_rng, StepCounts};
use rand_chacha::ChaCha8Rng;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Everything a worker needs to build and evolve its region
#[derive(Debug, Clone)]
pub struct WorkerSetup {
    pub index: usize,
    pub bounds: RegionBounds,
    /// Run seed; the worker derives its own stream from it
    pub seed: u64,
    pub wind: Wind,
    pub terrain: TerrainParams,
    pub spread: SpreadParams,
}

/// Start a named worker thread
///
/// The worker generates its terrain and fires, reports them as step 0,
/// then answers every `Continue` with one report until `Stop` or a
/// disconnect.
///
/// # Errors
///
/// [`SimError::WorkerSpawn`] if the OS refuses the thread
pub fn spawn_worker(
    setup: WorkerSetup,
    signals: Receiver<Signal>,
    reports: Sender<WorkerReport>,
) -> SimResult<JoinHandle<()>> {
    let index = setup.index;
    let worker = Worker {
        owner: index as OwnerId,
        rng: worker_rng(setup.seed, index as OwnerId),
        setup,
        signals,
        reports,
    };
    thread::Builder::new()
        .name(format!("fire-worker-{index}"))
        .spawn(move || worker.run())
        .map_err(|source| SimError::WorkerSpawn {
            worker: index,
            source,
        })
}

struct Worker {
    setup: WorkerSetup,
    owner: OwnerId,
    rng: ChaCha8Rng,
    signals: Receiver<Signal>,
    reports: Sender<WorkerReport>,
}

impl Worker {
    fn run(mut self) {
        let index = self.setup.index;
        let mut region = match self.initial_region() {
            Ok(region) => region,
            Err(e) => {
                self.fail(0, &e);
                return;
            }
        };

        loop {
            match self.signals.recv() {
                Ok(Signal::Continue { step }) => {
                    let outcome = match step_region(
                        &region,
                        &self.setup.wind,
                        &self.setup.spread,
                        step,
                        &mut self.rng,
                    ) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            self.fail(step, &e);
                            return;
                        }
                    };
                    region = outcome.region;
                    if !self.send(step, &region, outcome.counts) {
                        return;
                    }
                }
                Ok(Signal::Stop) => {
                    info!("Worker {}: stop received", index);
                    return;
                }
                Err(_) => {
                    debug!("Worker {}: coordinator link closed", index);
                    return;
                }
            }
        }
    }

    /// Generate terrain and fires, then report them as step 0
    fn initial_region(&mut self) -> SimResult<Region> {
        let mut region =
            generate_terrain(self.setup.bounds, self.owner, &self.setup.terrain, &mut self.rng)?;
        let seeding = initialize_fires(&mut region, &self.setup.spread, &mut self.rng);
        let counts = StepCounts {
            ignited: seeding.created,
            ..StepCounts::default()
        };
        self.send(0, &region, counts);
        Ok(region)
    }

    /// Returns false once the coordinator has gone
    fn send(&self, step: u64, region: &Region, counts: StepCounts) -> bool {
        let report = WorkerReport::Region {
            worker: self.setup.index,
            step,
            region: Box::new(region.clone()),
            counts,
        };
        if self.reports.send(report).is_err() {
            debug!("Worker {}: report channel closed", self.setup.index);
            return false;
        }
        true
    }

    fn fail(&self, step: u64, err: &SimError) {
        error!("Worker {}: step {} failed: {}", self.setup.index, step, err);
        let report = WorkerReport::Failed {
            worker: self.setup.index,
            step,
            reason: err.to_string(),
        };
        if self.reports.send(report).is_err() {
            debug!("Worker {}: report channel closed", self.setup.index);
        }
    }
}
