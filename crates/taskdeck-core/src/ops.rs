//! Operation sequencing and the pending-mutation ledger.
//!
//! Every user-initiated mutation captures a sequence number at the
//! moment it starts; authoritative refreshes bump the same counter.
//! When a remote call resolves, its captured value is compared against
//! the current one: only the latest operation may roll back or trigger
//! follow-up refreshes, so a stale callback can never undo newer state.
//!
//! Each mutation is also recorded as a [`PendingOp`] holding the prior
//! snapshots of every task it touched, tagged with its resolution.
//! The ledger exists for rollback and for deterministic auditing in
//! tests; it is session-scoped and never persisted.

use crate::model::{Task, TaskId};

/// The global monotonically increasing operation counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpSeq(u64);

impl OpSeq {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Issue the next sequence value.
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// The latest issued value.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.0
    }
}

/// How a pending operation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    /// Remote call still in flight.
    Pending,
    /// Remote call succeeded; the optimistic write stands.
    Committed,
    /// Remote call failed while still the latest op; snapshots were
    /// restored.
    RolledBack,
    /// Remote call failed after a newer operation started; the local
    /// state was left alone.
    Superseded,
}

/// One optimistic mutation: its sequence value and the prior field
/// values of every task it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOp {
    pub seq: u64,
    pub snapshots: Vec<(TaskId, Task)>,
    pub status: OpStatus,
}

impl PendingOp {
    #[must_use]
    pub const fn new(seq: u64, snapshots: Vec<(TaskId, Task)>) -> Self {
        Self {
            seq,
            snapshots,
            status: OpStatus::Pending,
        }
    }
}

/// Resolved entries retained for inspection before the log starts
/// discarding its oldest ones. Pending entries are never discarded.
const MAX_RESOLVED: usize = 64;

/// Session-scoped record of recent mutations and their resolutions.
#[derive(Debug, Clone, Default)]
pub struct OpLog {
    ops: Vec<PendingOp>,
}

impl OpLog {
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn record(&mut self, op: PendingOp) {
        self.ops.push(op);
    }

    /// Mark the op with `seq` resolved. Unknown sequences are ignored.
    /// Resolution also trims the log past its retention cap.
    pub fn resolve(&mut self, seq: u64, status: OpStatus) {
        if let Some(op) = self.ops.iter_mut().find(|op| op.seq == seq) {
            op.status = status;
        }
        self.prune();
    }

    fn prune(&mut self) {
        let mut resolved = self
            .ops
            .iter()
            .filter(|op| op.status != OpStatus::Pending)
            .count();
        // retain walks oldest-first, so the overflow drops from the
        // front of the log.
        self.ops.retain(|op| {
            if op.status == OpStatus::Pending || resolved <= MAX_RESOLVED {
                true
            } else {
                resolved -= 1;
                false
            }
        });
    }

    /// The prior snapshots captured by the op with `seq`.
    #[must_use]
    pub fn snapshots_of(&self, seq: u64) -> Option<&[(TaskId, Task)]> {
        self.ops
            .iter()
            .find(|op| op.seq == seq)
            .map(|op| op.snapshots.as_slice())
    }

    #[must_use]
    pub fn status_of(&self, seq: u64) -> Option<OpStatus> {
        self.ops.iter().find(|op| op.seq == seq).map(|op| op.status)
    }

    #[must_use]
    pub fn entries(&self) -> &[PendingOp] {
        &self.ops
    }
}
