// ============================================================================
// Write-Set Tracking
// ============================================================================
//
// A unit of work is the host engine's request/transaction scope. While it is
// open, every CREATE/UPDATE/DELETE marks the touched entity type dirty; the
// router then refuses to serve reads of dirty (or structurally coupled) types
// from a lagging replica. The set is cleared when the host signals the
// boundary, or simply dropped with the unit of work.
//
// ============================================================================

use crate::core::{ChangeType, EntityType};
use log::trace;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global unit-of-work ID counter
static NEXT_UOW_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitOfWorkId(pub u64);

impl UnitOfWorkId {
    /// Generate a new unique unit-of-work ID
    pub fn new() -> Self {
        UnitOfWorkId(NEXT_UOW_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for UnitOfWorkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UnitOfWorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "uow_{}", self.0)
    }
}

/// Mutable per-request state: the set of entity types with pending writes.
///
/// Owned by exactly one task for its lifetime. The router only ever borrows
/// it (`Option<&UnitOfWork>`), and recording takes `&mut self`, so a unit of
/// work cannot leak across requests. Granularity is the entity type: one
/// written `Order` row dirties ALL orders.
#[derive(Debug)]
pub struct UnitOfWork {
    id: UnitOfWorkId,
    write_set: HashSet<EntityType>,
}

impl UnitOfWork {
    /// Open a new, empty unit of work
    pub fn begin() -> Self {
        let id = UnitOfWorkId::new();
        trace!("{} begun", id);
        Self {
            id,
            write_set: HashSet::new(),
        }
    }

    pub fn id(&self) -> UnitOfWorkId {
        self.id
    }

    /// Mark an entity type dirty. Idempotent: recording the same type again,
    /// under any change kind, is a no-op. The set never shrinks until `reset`.
    pub fn record(&mut self, change: ChangeType, entity: &EntityType) {
        if self.write_set.insert(entity.clone()) {
            trace!("{}: {} marked dirty by {}", self.id, entity, change);
        }
    }

    pub fn write_set(&self) -> &HashSet<EntityType> {
        &self.write_set
    }

    pub fn has_writes(&self) -> bool {
        !self.write_set.is_empty()
    }

    pub fn contains(&self, entity: &EntityType) -> bool {
        self.write_set.contains(entity)
    }

    /// Clear the write set at the unit-of-work boundary (commit or rollback -
    /// either way the next request starts clean).
    pub fn reset(&mut self) {
        if !self.write_set.is_empty() {
            trace!("{}: write set of {} entities cleared", self.id, self.write_set.len());
        }
        self.write_set.clear();
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::begin()
    }
}
