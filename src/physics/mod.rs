//! The physics collaborator boundary.
//!
//! Constraint solving and rigid body dynamics live outside this crate. A
//! [`PhysicsWorld`] creates breakable joints between islands and reports
//! whether a joint still holds; the fracture pipeline only ever sees an opaque
//! [`ConstraintHandle`].

use crate::constraint::ConstraintKind;
use crate::errors::FractureResult;
use crate::float_types::Real;
use crate::island::{Island, IslandId};
use hashbrown::HashMap;

pub mod rapier;

pub use rapier::RapierWorld;

/// Opaque reference to a joint owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub u64);

pub trait PhysicsWorld {
    /// Create a joint between two islands that fails above `threshold`.
    fn create_breakable_constraint(
        &mut self,
        kind: ConstraintKind,
        a: &Island,
        b: &Island,
        threshold: Real,
    ) -> FractureResult<ConstraintHandle>;

    /// Whether the joint still holds. Unknown handles are never enabled.
    fn is_enabled(&self, handle: ConstraintHandle) -> bool;
}

/// What a [`BookkeepingWorld`] knows about one joint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    pub kind: ConstraintKind,
    pub islands: (IslandId, IslandId),
    pub threshold: Real,
    pub enabled: bool,
}

/// A world that only records joints; hosts break them by hand.
#[derive(Debug, Clone, Default)]
pub struct BookkeepingWorld {
    next: u64,
    records: HashMap<ConstraintHandle, ConstraintRecord>,
}

impl BookkeepingWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, handle: ConstraintHandle) -> Option<&ConstraintRecord> {
        self.records.get(&handle)
    }

    /// Returns `false` for an unknown handle.
    pub fn set_enabled(&mut self, handle: ConstraintHandle, enabled: bool) -> bool {
        match self.records.get_mut(&handle) {
            Some(record) => {
                record.enabled = enabled;
                true
            },
            None => false,
        }
    }

    /// Break every joint.
    pub fn disable_all(&mut self) {
        self.records.values_mut().for_each(|record| record.enabled = false);
    }
}

impl PhysicsWorld for BookkeepingWorld {
    fn create_breakable_constraint(
        &mut self,
        kind: ConstraintKind,
        a: &Island,
        b: &Island,
        threshold: Real,
    ) -> FractureResult<ConstraintHandle> {
        let handle = ConstraintHandle(self.next);
        self.next += 1;
        self.records.insert(
            handle,
            ConstraintRecord {
                kind,
                islands: (a.id, b.id),
                threshold,
                enabled: true,
            },
        );
        Ok(handle)
    }

    fn is_enabled(&self, handle: ConstraintHandle) -> bool {
        self.records.get(&handle).is_some_and(|record| record.enabled)
    }
}
