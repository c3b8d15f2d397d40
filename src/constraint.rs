//! Breakable connections between islands.

use crate::float_types::Real;
use crate::island::IslandId;
use crate::physics::{ConstraintHandle, PhysicsWorld};

/// Physical joint type handed to the physics collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Locks all relative motion until broken
    #[default]
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub mi1: IslandId,
    pub mi2: IslandId,
    pub kind: ConstraintKind,
    pub breaking_threshold: Real,
    /// Set once the physics collaborator has created the joint
    pub physics_constraint: Option<ConstraintHandle>,
}

impl Constraint {
    pub fn new(mi1: IslandId, mi2: IslandId, breaking_threshold: Real) -> Self {
        Constraint {
            mi1,
            mi2,
            kind: ConstraintKind::Fixed,
            breaking_threshold,
            physics_constraint: None,
        }
    }

    /// Whether this constraint relates `a` and `b`, in either order.
    #[inline]
    pub fn connects(&self, a: IslandId, b: IslandId) -> bool {
        (self.mi1 == a && self.mi2 == b) || (self.mi1 == b && self.mi2 == a)
    }

    /// True only for a realized joint that `world` reports as enabled.
    pub fn is_enabled(&self, world: &dyn PhysicsWorld) -> bool {
        self.physics_constraint
            .is_some_and(|handle| world.is_enabled(handle))
    }
}

/// The constraint relating `a` and `b`, if any.
pub fn find_constraint(constraints: &[Constraint], a: IslandId, b: IslandId) -> Option<&Constraint> {
    constraints.iter().find(|con| con.connects(a, b))
}

/// Two anti-parallel faces of the visible mesh closing a seam between islands.
///
/// Whether the seam is drawn is decided by the constraint between `islands`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectedFacePair {
    pub faces: [usize; 2],
    pub islands: (IslandId, IslandId),
}

impl SelectedFacePair {
    /// Same seam, regardless of face order.
    pub fn same_faces(&self, other: &SelectedFacePair) -> bool {
        let [a, b] = self.faces;
        other.faces == [a, b] || other.faces == [b, a]
    }
}
