use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, trace};

use crate::arena::{PackageArena, PackageId, PackageState, Probe};
use crate::types::PackageOutcome;

/// Named checkpoints passed from one package to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Admits one pipeline at a time until it has verified its conditions.
    ReadyForRelease,
    /// Serializes manifest updates and tag creation across packages.
    ReadyForTagging,
}

/// Restricts a barrier to the pending packages it returns `true` for.
pub type BarrierFilter = fn(&PackageState) -> bool;

/// Decides whether a pending package may receive a gate. Reads other packages'
/// state through the arena, one guard at a time.
pub type PassFilter = fn(&PackageArena, PackageId) -> bool;

struct PendingBarrier {
    probe: Probe,
    filter: Option<BarrierFilter>,
    release: oneshot::Sender<()>,
}

/// Signal bus of one run.
///
/// Signals are one-shot and memoized per gate and package: waiting on a signal
/// that already fired completes at once. Barriers wait until every pending
/// package has reached a probe and are re-checked on every probe or outcome change.
pub struct Synchronizer {
    arena: Arc<PackageArena>,
    signals: Mutex<HashMap<(Gate, PackageId), watch::Sender<bool>>>,
    claimed: Mutex<HashSet<Gate>>,
    barriers: Mutex<Vec<PendingBarrier>>,
}

impl Synchronizer {
    #[must_use]
    pub fn new(arena: Arc<PackageArena>) -> Self {
        Self {
            arena,
            signals: Mutex::new(HashMap::new()),
            claimed: Mutex::new(HashSet::new()),
            barriers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn arena(&self) -> &Arc<PackageArena> {
        &self.arena
    }

    /// Counts the package as pending from now on.
    pub fn start(&self, id: PackageId) {
        self.arena.state_mut(id).start();
    }

    pub fn signal(&self, gate: Gate, id: PackageId) {
        let mut signals = self.signals.lock();
        let sender = signals
            .entry((gate, id))
            .or_insert_with(|| watch::channel(false).0);
        if !sender.send_replace(true) {
            trace!(?gate, package = %self.arena.package(id).name, "signal fired");
        }
    }

    #[must_use]
    pub fn is_signaled(&self, gate: Gate, id: PackageId) -> bool {
        self.signals
            .lock()
            .get(&(gate, id))
            .is_some_and(|sender| *sender.borrow())
    }

    /// Completes once `gate` has been signaled for `id`.
    pub async fn wait_for(&self, gate: Gate, id: PackageId) {
        let mut receiver = self
            .signals
            .lock()
            .entry((gate, id))
            .or_insert_with(|| watch::channel(false).0)
            .subscribe();
        // The sender lives as long as `self`, so this only errs during teardown.
        let _ = receiver.wait_for(|fired| *fired).await;
    }

    /// Signals `gate` for `id` unless another package claimed it first.
    /// Returns whether this call won the claim.
    pub fn first_claim(&self, gate: Gate, id: PackageId) -> bool {
        let won = self.claimed.lock().insert(gate);
        if won {
            debug!(?gate, package = %self.arena.package(id).name, "claimed gate");
            self.signal(gate, id);
        }
        won
    }

    /// Claims `gate` if nobody holds it and hands it to the first pending
    /// package accepted by `eligible`, which may be none.
    pub fn offer(&self, gate: Gate, eligible: PassFilter) -> Option<PackageId> {
        if !self.claimed.lock().insert(gate) {
            return None;
        }
        self.pass_to(gate, eligible)
    }

    /// Hands `gate` to the first pending package accepted by `eligible`.
    ///
    /// When no package qualifies the claim is released, so the next
    /// [`first_claim`](Self::first_claim) or [`offer`](Self::offer) wins again.
    pub fn pass_to(&self, gate: Gate, eligible: PassFilter) -> Option<PackageId> {
        let next = (0..self.arena.len()).find(|&id| {
            let pending = self.arena.state(id).is_pending();
            pending && eligible(&self.arena, id)
        });

        match next {
            Some(id) => self.signal(gate, id),
            None => {
                self.claimed.lock().remove(&gate);
            }
        }
        next
    }

    /// Records that `id` reached `probe`.
    pub fn mark(&self, id: PackageId, probe: Probe) {
        let newly_set = self.arena.state_mut(id).set(probe);
        if newly_set {
            self.recheck_barriers();
        }
    }

    /// Records the final outcome of `id`. Returns `false` if it already had one.
    pub fn finish(&self, id: PackageId, outcome: PackageOutcome) -> bool {
        let recorded = self.arena.state_mut(id).finish(outcome);
        if recorded {
            self.recheck_barriers();
        }
        recorded
    }

    /// Completes once every pending package selected by `filter` has reached `probe`.
    pub async fn wait_all_reached(&self, probe: Probe, filter: Option<BarrierFilter>) {
        let receiver = {
            let mut barriers = self.barriers.lock();
            if self.all_reached(probe, filter) {
                return;
            }
            let (release, receiver) = oneshot::channel();
            barriers.push(PendingBarrier {
                probe,
                filter,
                release,
            });
            receiver
        };
        let _ = receiver.await;
    }

    fn all_reached(&self, probe: Probe, filter: Option<BarrierFilter>) -> bool {
        (0..self.arena.len()).all(|id| {
            let state = self.arena.state(id);
            let counted = state.is_pending() && filter.is_none_or(|filter| filter(&state));
            !counted || state.has(probe)
        })
    }

    fn recheck_barriers(&self) {
        let released: Vec<PendingBarrier> = {
            let mut barriers = self.barriers.lock();
            let (released, waiting): (Vec<_>, Vec<_>) = barriers
                .drain(..)
                .partition(|barrier| self.all_reached(barrier.probe, barrier.filter));
            *barriers = waiting;
            released
        };

        for barrier in released {
            debug!(probe = ?barrier.probe, "all pending packages reached probe");
            let _ = barrier.release.send(());
        }
    }
}
