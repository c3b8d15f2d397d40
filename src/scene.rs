//! The slice of the host scene a modifier evaluation can see.

use crate::float_types::Real;
use crate::modifier::FractureModifier;
use crate::physics::PhysicsWorld;
use hashbrown::HashMap;
use nalgebra::Matrix4;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

/// Identity of a modifier instance, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierId(u64);

static NEXT_MODIFIER_ID: AtomicU64 = AtomicU64::new(1);

impl ModifierId {
    pub fn next() -> Self {
        ModifierId(NEXT_MODIFIER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// An object being evaluated: its identity and world transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub world: Matrix4<Real>,
}

impl ObjectInfo {
    pub fn new(id: ObjectId) -> Self {
        ObjectInfo {
            id,
            world: Matrix4::identity(),
        }
    }

    pub fn with_world(mut self, world: Matrix4<Real>) -> Self {
        self.world = world;
        self
    }
}

/// Objects whose islands are connected together, in member order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintGroup {
    pub id: GroupId,
    pub objects: Vec<ObjectId>,
}

impl ConstraintGroup {
    pub fn new(id: GroupId, objects: Vec<ObjectId>) -> Self {
        ConstraintGroup { id, objects }
    }

    #[inline]
    pub fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains(&object)
    }
}

/// Modifier stacks of the scene's objects, in stack order.
pub type ModifierStacks = HashMap<ObjectId, Vec<FractureModifier>>;

/// Everything one `apply` call may read besides the input mesh.
///
/// The modifier being evaluated must not be reachable through `stacks`;
/// hosts take it out of its stack for the duration of the call.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub object: &'a ObjectInfo,
    pub groups: &'a [ConstraintGroup],
    pub stacks: Option<&'a ModifierStacks>,
    pub physics: Option<&'a dyn PhysicsWorld>,
}

impl<'a> EvalContext<'a> {
    /// A context for an object without groups, peers or physics.
    pub fn standalone(object: &'a ObjectInfo) -> Self {
        EvalContext {
            object,
            groups: &[],
            stacks: None,
            physics: None,
        }
    }

    pub fn with_groups(mut self, groups: &'a [ConstraintGroup]) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_stacks(mut self, stacks: &'a ModifierStacks) -> Self {
        self.stacks = Some(stacks);
        self
    }

    pub fn with_physics(mut self, physics: &'a dyn PhysicsWorld) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn group(&self, id: GroupId) -> Option<&'a ConstraintGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Fracture modifiers on every member of `group`, in member then stack order.
    pub fn group_modifiers(&self, group: &ConstraintGroup) -> Vec<&'a FractureModifier> {
        let Some(stacks) = self.stacks else {
            return Vec::new();
        };
        group
            .objects
            .iter()
            .filter_map(|object| stacks.get(object))
            .flat_map(|stack| stack.iter())
            .collect()
    }
}
