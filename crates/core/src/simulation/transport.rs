//! Coordinator <-> worker messaging
//!
//! Signals go out over one channel per worker; reports come back over a
//! single shared channel. `std::sync::mpsc` channels buffer, so a signal
//! sent before the worker starts waiting is not lost.

use crate::grid::Region;
use crate::solver::StepCounts;
use std::collections::BTreeSet;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Coordinator -> worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Compute step `step` and report
    Continue { step: u64 },
    /// Exit the worker loop
    Stop,
}

/// Worker -> coordinator
///
/// Step 0 carries the freshly generated region; `counts.ignited` then holds
/// the number of seeded fires.
#[derive(Debug)]
pub enum WorkerReport {
    Region {
        worker: usize,
        step: u64,
        region: Box<Region>,
        counts: StepCounts,
    },
    Failed {
        worker: usize,
        step: u64,
        reason: String,
    },
}

impl WorkerReport {
    pub fn worker(&self) -> usize {
        match self {
            Self::Region { worker, .. } | Self::Failed { worker, .. } => *worker,
        }
    }

    pub fn step(&self) -> u64 {
        match self {
            Self::Region { step, .. } | Self::Failed { step, .. } => *step,
        }
    }
}

/// Signal links to every worker, indexed by worker id
///
/// A dropped link is `None`; the worker sees a disconnect on its next wait.
#[derive(Debug)]
pub struct Broadcaster {
    links: Vec<Option<Sender<Signal>>>,
}

impl Broadcaster {
    pub fn new(links: Vec<Sender<Signal>>) -> Self {
        Self {
            links: links.into_iter().map(Some).collect(),
        }
    }

    /// Send `signal` to every linked worker
    ///
    /// Returns the workers whose receiving end is gone; their links are
    /// dropped.
    pub fn broadcast(&mut self, signal: Signal) -> Vec<usize> {
        let mut closed = Vec::new();
        for (worker, link) in self.links.iter_mut().enumerate() {
            if let Some(sender) = link {
                if sender.send(signal).is_err() {
                    debug!("Worker {}: signal link closed", worker);
                    *link = None;
                    closed.push(worker);
                }
            }
        }
        closed
    }

    /// Drop the link to one worker
    pub fn disconnect(&mut self, worker: usize) {
        if let Some(link) = self.links.get_mut(worker) {
            *link = None;
        }
    }

    pub fn disconnect_all(&mut self) {
        self.links.iter_mut().for_each(|link| *link = None);
    }

    pub fn is_linked(&self, worker: usize) -> bool {
        self.links.get(worker).is_some_and(Option::is_some)
    }

    /// Ids of workers still linked, ascending
    pub fn linked(&self) -> Vec<usize> {
        (0..self.links.len())
            .filter(|&worker| self.is_linked(worker))
            .collect()
    }
}

/// Region delivered for the step being collected
#[derive(Debug)]
pub struct Delivered {
    pub worker: usize,
    pub region: Box<Region>,
    pub counts: StepCounts,
}

/// Outcome of one collect phase
#[derive(Debug, Default)]
pub struct Collection {
    /// Fresh regions, in arrival order
    pub delivered: Vec<Delivered>,
    /// Workers that reported a failure, with the reason
    pub failed: Vec<(usize, String)>,
    /// Workers that said nothing before the deadline
    pub missing: Vec<usize>,
}

impl Collection {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.missing.is_empty()
    }
}

/// Receiving end of the shared report channel
#[derive(Debug)]
pub struct Collector {
    receiver: Receiver<WorkerReport>,
    timeout: Duration,
}

impl Collector {
    pub fn new(receiver: Receiver<WorkerReport>, timeout: Duration) -> Self {
        Self { receiver, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Gather one report per `expected` worker for `step`
    ///
    /// Reports may arrive in any order. Reports for another step, from
    /// workers not expected, or duplicates are discarded with a warning.
    /// Stops at the deadline or when every sender is gone.
    pub fn collect(&self, step: u64, expected: &[usize]) -> Collection {
        let deadline = Instant::now() + self.timeout;
        let mut pending: BTreeSet<usize> = expected.iter().copied().collect();
        let mut collection = Collection::default();

        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let report = match self.receiver.recv_timeout(remaining) {
                Ok(report) => report,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Every worker has hung up while collecting step {}", step);
                    break;
                }
            };

            let worker = report.worker();
            if report.step() != step {
                warn!(
                    "Worker {}: discarding report for step {} while collecting step {}",
                    worker,
                    report.step(),
                    step
                );
                continue;
            }
            if !pending.remove(&worker) {
                warn!(
                    "Worker {}: discarding unexpected report for step {}",
                    worker, step
                );
                continue;
            }

            match report {
                WorkerReport::Region { region, counts, .. } => {
                    collection.delivered.push(Delivered {
                        worker,
                        region,
                        counts,
                    });
                }
                WorkerReport::Failed { reason, .. } => collection.failed.push((worker, reason)),
            }
        }

        collection.missing = pending.into_iter().collect();
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Cell;
    use crate::grid::RegionBounds;
    use std::sync::mpsc;

    fn report(worker: usize, step: u64) -> WorkerReport {
        WorkerReport::Region {
            worker,
            step,
            region: Box::new(Region::uniform(
                RegionBounds::full(2, 2),
                worker as u16,
                Cell::Empty,
                0.0,
                0.5,
                25.0,
            )),
            counts: StepCounts::default(),
        }
    }

    #[test]
    fn test_broadcast_reaches_every_linked_worker() {
        let (tx0, rx0) = mpsc::channel();
        let (tx1, rx1) = mpsc::channel();
        let mut broadcaster = Broadcaster::new(vec![tx0, tx1]);

        assert!(broadcaster.broadcast(Signal::Continue { step: 1 }).is_empty());
        assert_eq!(rx0.recv().unwrap(), Signal::Continue { step: 1 });
        assert_eq!(rx1.recv().unwrap(), Signal::Continue { step: 1 });

        broadcaster.disconnect(1);
        assert_eq!(broadcaster.linked(), vec![0]);
        broadcaster.broadcast(Signal::Stop);
        assert_eq!(rx0.recv().unwrap(), Signal::Stop);
        assert!(rx1.recv().is_err());
    }

    #[test]
    fn test_broadcast_drops_closed_links() {
        let (tx0, rx0) = mpsc::channel();
        let mut broadcaster = Broadcaster::new(vec![tx0]);
        drop(rx0);
        assert_eq!(broadcaster.broadcast(Signal::Stop), vec![0]);
        assert!(!broadcaster.is_linked(0));
    }

    #[test]
    fn test_collect_any_order() {
        let (tx, rx) = mpsc::channel();
        let collector = Collector::new(rx, Duration::from_secs(5));
        for worker in [2, 0, 1] {
            tx.send(report(worker, 3)).unwrap();
        }
        let collection = collector.collect(3, &[0, 1, 2]);
        assert!(collection.is_complete());
        let mut workers: Vec<_> = collection.delivered.iter().map(|d| d.worker).collect();
        workers.sort_unstable();
        assert_eq!(workers, vec![0, 1, 2]);
    }

    #[test]
    fn test_collect_discards_old_and_reports_missing() {
        let (tx, rx) = mpsc::channel();
        let collector = Collector::new(rx, Duration::from_millis(50));
        tx.send(report(0, 1)).unwrap();
        tx.send(report(0, 2)).unwrap();
        tx.send(WorkerReport::Failed {
            worker: 1,
            step: 2,
            reason: "boom".into(),
        })
        .unwrap();

        let collection = collector.collect(2, &[0, 1, 2]);
        assert_eq!(collection.delivered.len(), 1);
        assert_eq!(collection.failed, vec![(1, "boom".to_string())]);
        assert_eq!(collection.missing, vec![2]);
    }
}
