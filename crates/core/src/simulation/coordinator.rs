//! Step coordinator
//!
//! Owns the step counter, the worker links and the last-known region of
//! every worker. Each round runs
//!
//! ```text
//! BroadcastContinue -> LocalStep (workers) -> Collect -> Reassemble -> Render
//! ```
//!
//! A worker that fails or sends a malformed region is excluded from later
//! rounds, as is one that times out; its
//! last-known region keeps filling its part of the global grid and the
//! round is flagged incomplete.

use super::control::ControlHandle;
use super::transport::{Broadcaster, Collector, Signal, WorkerReport};
use super::worker::{spawn_worker, WorkerSetup};
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::grid::{partition_all, FireStats, GlobalGrid, Region, RegionBounds};
use crate::solver::StepCounts;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often a paused run re-checks its controls
const PAUSE_POLL: Duration = Duration::from_millis(20);

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Workers are up, no round has run yet
    Idle,
    Running,
    /// Stop has been sent; no further rounds
    Terminated,
}

/// Everything produced by one round
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub step: u64,
    pub grid: GlobalGrid,
    pub stats: FireStats,
    /// Summed over the workers that reported this round
    pub counts: StepCounts,
    /// Workers whose last-known region stands in for a fresh one
    pub stale_workers: Vec<usize>,
}

impl RoundReport {
    /// Whether every region in the grid is from this step
    pub fn is_complete(&self) -> bool {
        self.stale_workers.is_empty()
    }
}

/// Consumer of round reports (a renderer, a recorder, a test probe)
pub trait FrameSink {
    fn frame(&mut self, report: &RoundReport);
}

impl<F: FnMut(&RoundReport)> FrameSink for F {
    fn frame(&mut self, report: &RoundReport) {
        self(report);
    }
}

/// Why [`Coordinator::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_steps` reached
    Completed,
    /// Operator asked to stop
    Stopped,
    /// No worker left to step
    WorkersLost,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Rounds run by this call
    pub rounds: u64,
    /// Step counter when the run ended
    pub final_step: u64,
    pub reason: StopReason,
    pub final_stats: Option<FireStats>,
}

/// Drives every worker through lock-step rounds
pub struct Coordinator {
    config: SimulationConfig,
    seed: u64,
    state: CoordinatorState,
    step: u64,
    /// Rounds since start; unaffected by reset
    rounds: u64,
    bounds: Vec<RegionBounds>,
    regions: Vec<Region>,
    broadcaster: Broadcaster,
    collector: Collector,
    handles: Vec<Option<JoinHandle<()>>>,
    control: ControlHandle,
}

impl Coordinator {
    /// Validate `config`, start one worker per region and wait for every
    /// initial region
    ///
    /// # Errors
    ///
    /// Any configuration error, [`SimError::WorkerSpawn`], or
    /// [`SimError::WorkerStartup`] if a worker fails or stays silent
    /// during startup
    pub fn spawn(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let seed = config.resolved_seed();
        let bounds = partition_all(config.rows, config.cols, config.workers)?;
        info!(
            "Starting {} worker(s) on a {}x{} grid ({} fire model, seed {})",
            config.workers, config.rows, config.cols, config.spread.model, seed
        );

        let (report_tx, report_rx) = mpsc::channel();
        let mut links = Vec::with_capacity(bounds.len());
        let mut handles = Vec::with_capacity(bounds.len());
        for (index, &region_bounds) in bounds.iter().enumerate() {
            let (signal_tx, signal_rx) = mpsc::channel();
            let setup = WorkerSetup {
                index,
                bounds: region_bounds,
                seed,
                wind: config.wind,
                terrain: config.terrain.clone(),
                spread: config.spread.clone(),
            };
            // On error the links built so far drop and those workers exit
            handles.push(spawn_worker(setup, signal_rx, report_tx.clone())?);
            links.push(signal_tx);
        }
        drop(report_tx);

        Self::start(config, seed, bounds, links, handles, report_rx)
    }

    /// Collect the step-0 regions from already running workers
    fn start(
        config: SimulationConfig,
        seed: u64,
        bounds: Vec<RegionBounds>,
        links: Vec<Sender<Signal>>,
        handles: Vec<JoinHandle<()>>,
        reports: Receiver<WorkerReport>,
    ) -> SimResult<Self> {
        let timeout = Duration::from_millis(config.worker_timeout_ms);
        let mut broadcaster = Broadcaster::new(links);
        let collector = Collector::new(reports, timeout);
        let handles: Vec<_> = handles.into_iter().map(Some).collect();

        let expected: Vec<usize> = (0..bounds.len()).collect();
        let collection = collector.collect(0, &expected);

        let mut initial: Vec<Option<Region>> = vec![None; bounds.len()];
        let mut startup_error = None;
        if let Some((worker, reason)) = collection.failed.first() {
            startup_error = Some(SimError::WorkerStartup {
                worker: *worker,
                reason: reason.clone(),
            });
        } else if let Some(&worker) = collection.missing.first() {
            startup_error = Some(SimError::WorkerStartup {
                worker,
                reason: format!("no initial region within {} ms", timeout.as_millis()),
            });
        }
        let mut seeded = 0;
        for delivered in collection.delivered {
            if delivered.region.bounds != bounds[delivered.worker] {
                if startup_error.is_none() {
                    startup_error = Some(SimError::WorkerStartup {
                        worker: delivered.worker,
                        reason: format!(
                            "initial region covers {:?}, expected {:?}",
                            delivered.region.bounds, bounds[delivered.worker]
                        ),
                    });
                }
                continue;
            }
            seeded += delivered.counts.ignited;
            initial[delivered.worker] = Some(*delivered.region);
        }

        let regions = match (startup_error, initial.into_iter().collect::<Option<Vec<_>>>()) {
            (None, Some(regions)) => regions,
            (err, _) => {
                broadcaster.broadcast(Signal::Stop);
                broadcaster.disconnect_all();
                join_workers(handles);
                let err = err.unwrap_or_else(|| SimError::WorkerStartup {
                    worker: 0,
                    reason: "initial regions incomplete".to_string(),
                });
                error!("Startup failed: {}", err);
                return Err(err);
            }
        };

        info!(
            "All {} worker(s) ready; {} initial fire(s) seeded",
            regions.len(),
            seeded
        );
        Ok(Self {
            config,
            seed,
            state: CoordinatorState::Idle,
            step: 0,
            rounds: 0,
            bounds,
            regions,
            broadcaster,
            collector,
            handles,
            control: ControlHandle::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Seed the run actually used
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Steps completed since start or the last reset
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Rounds completed since start, counted against `max_steps`
    pub fn rounds_run(&self) -> u64 {
        self.rounds
    }

    /// Workers still taking part in rounds
    pub fn live_workers(&self) -> usize {
        self.broadcaster.linked().len()
    }

    /// Handle for pause, reset and stop requests
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Last-known regions indexed by worker id
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Global grid from the last-known regions, without running a round
    ///
    /// # Errors
    ///
    /// [`SimError::Assembly`] if the regions no longer tile the grid
    pub fn snapshot(&self) -> SimResult<GlobalGrid> {
        Ok(GlobalGrid::assemble(self.config.rows, self.config.cols, &self.regions)?
            .at_step(self.step))
    }

    /// Restart the step counter; region state and the round budget are kept
    pub fn reset_step_counter(&mut self) {
        info!("Step counter reset (was {})", self.step);
        self.step = 0;
    }

    /// Run one lock-step round
    ///
    /// # Errors
    ///
    /// [`SimError::Terminated`] after shutdown, [`SimError::Assembly`] if
    /// reassembly fails
    pub fn run_round(&mut self) -> SimResult<RoundReport> {
        if self.state == CoordinatorState::Terminated {
            return Err(SimError::Terminated);
        }
        self.state = CoordinatorState::Running;
        self.step += 1;
        self.rounds += 1;
        let step = self.step;

        let expected = self.broadcaster.linked();
        for worker in self.broadcaster.broadcast(Signal::Continue { step }) {
            warn!("Worker {}: gone before step {}; excluding it", worker, step);
        }
        let expected: Vec<usize> = expected
            .into_iter()
            .filter(|&worker| self.broadcaster.is_linked(worker))
            .collect();
        debug!("Step {}: waiting for {} worker(s)", step, expected.len());

        let collection = self.collector.collect(step, &expected);

        let mut fresh = vec![false; self.regions.len()];
        let mut counts = StepCounts::default();
        for delivered in collection.delivered {
            let worker = delivered.worker;
            let rejected = if delivered.region.bounds == self.bounds[worker] {
                delivered.region.validate().err().map(|e| e.to_string())
            } else {
                Some(format!(
                    "region covers {:?}, expected {:?}",
                    delivered.region.bounds, self.bounds[worker]
                ))
            };
            if let Some(reason) = rejected {
                error!(
                    "Worker {}: malformed region at step {}: {}; excluding it",
                    worker, step, reason
                );
                self.broadcaster.disconnect(worker);
                continue;
            }
            self.regions[worker] = *delivered.region;
            counts += delivered.counts;
            fresh[worker] = true;
        }
        for (worker, reason) in &collection.failed {
            error!("Worker {}: failed at step {}: {}", worker, step, reason);
            self.broadcaster.disconnect(*worker);
        }
        for &worker in &collection.missing {
            warn!(
                "Worker {}: no report for step {} within {} ms; excluding it",
                worker,
                step,
                self.collector.timeout().as_millis()
            );
            self.broadcaster.disconnect(worker);
        }

        let stale_workers: Vec<usize> = (0..fresh.len()).filter(|&w| !fresh[w]).collect();
        if !stale_workers.is_empty() {
            warn!(
                "Step {}: using last-known regions for worker(s) {:?}",
                step, stale_workers
            );
        }

        let grid = GlobalGrid::assemble(self.config.rows, self.config.cols, &self.regions)?
            .at_step(step);
        let stats = grid.stats();
        Ok(RoundReport {
            step,
            grid,
            stats,
            counts,
            stale_workers,
        })
    }

    /// Run rounds until `max_steps` rounds have run, an operator stop, or
    /// loss of every worker, handing each report to `sink`
    ///
    /// A reset restarts the step counter but not the round budget.
    ///
    /// # Errors
    ///
    /// Propagates [`Coordinator::run_round`] errors
    pub fn run<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> SimResult<RunSummary> {
        let interval = Duration::from_millis(self.config.frame_interval_ms);
        let mut rounds = 0;
        let mut final_stats = None;

        let reason = loop {
            if self.control.stop_requested() {
                break StopReason::Stopped;
            }
            if self.control.take_reset() {
                self.reset_step_counter();
            }
            if self.control.is_paused() {
                thread::sleep(PAUSE_POLL);
                continue;
            }
            if self.rounds >= self.config.max_steps {
                break StopReason::Completed;
            }
            if self.live_workers() == 0 {
                break StopReason::WorkersLost;
            }

            let report = self.run_round()?;
            rounds += 1;
            final_stats = Some(report.stats);
            sink.frame(&report);
            drop(report);

            if !interval.is_zero() {
                thread::sleep(interval);
            }
        };

        info!(
            "Run ended after {} round(s) at step {}: {:?}",
            rounds, self.step, reason
        );
        Ok(RunSummary {
            rounds,
            final_step: self.step,
            reason,
            final_stats,
        })
    }

    /// Send `Stop` once to every linked worker and join every thread
    pub fn shutdown(&mut self) {
        if self.state == CoordinatorState::Terminated {
            return;
        }
        self.state = CoordinatorState::Terminated;
        let linked = self.broadcaster.linked().len();
        self.broadcaster.broadcast(Signal::Stop);
        self.broadcaster.disconnect_all();
        info!("Stop sent to {} worker(s)", linked);
        join_workers(std::mem::take(&mut self.handles));
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_workers(handles: Vec<Option<JoinHandle<()>>>) {
    for (worker, handle) in handles.into_iter().enumerate() {
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Worker {}: thread panicked", worker);
            }
        }
    }
}
