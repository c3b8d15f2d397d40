//! Rapier-backed physics collaborator.
//!
//! Each island becomes one dynamic rigid body with a trimesh collider, placed at
//! the island centroid with the island's initial rotation. Constraints become
//! fixed impulse joints anchored halfway between the two centroids.

use super::{ConstraintHandle, PhysicsWorld};
use crate::constraint::ConstraintKind;
use crate::errors::FractureResult;
use crate::float_types::{
    Real,
    rapier3d::prelude::{
        ColliderBuilder, ColliderSet, FixedJointBuilder, ImpulseJointHandle, ImpulseJointSet,
        RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape,
    },
};
use crate::island::{Island, IslandId};
use hashbrown::HashMap;
use nalgebra::{Isometry3, Point3, Translation3};
use tracing::debug;

/// Radius of the stand-in collider for islands without faces.
const POINT_ISLAND_RADIUS: Real = 0.01;

pub struct RapierWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    density: Real,
    island_bodies: HashMap<IslandId, RigidBodyHandle>,
    joints: HashMap<ConstraintHandle, ImpulseJointHandle>,
    thresholds: HashMap<ImpulseJointHandle, Real>,
    next: u64,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RapierWorld {
    pub fn new(density: Real) -> Self {
        RapierWorld {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            density,
            island_bodies: HashMap::new(),
            joints: HashMap::new(),
            thresholds: HashMap::new(),
            next: 0,
        }
    }

    pub fn body_of(&self, island: IslandId) -> Option<RigidBodyHandle> {
        self.island_bodies.get(&island).copied()
    }

    pub fn joint_of(&self, handle: ConstraintHandle) -> Option<ImpulseJointHandle> {
        self.joints.get(&handle).copied()
    }

    /// The island's rigid body, created on first use.
    ///
    /// ## Errors
    /// If Parry rejects the island's triangles
    pub fn ensure_body(&mut self, island: &Island) -> FractureResult<RigidBodyHandle> {
        if let Some(handle) = self.body_of(island.id) {
            return Ok(handle);
        }

        let collider = if island.physics_mesh.face_count() > 0 {
            let shape = SharedShape::new(island.physics_mesh.to_trimesh()?);
            ColliderBuilder::new(shape).density(self.density).build()
        } else {
            ColliderBuilder::ball(POINT_ISLAND_RADIUS)
                .density(self.density)
                .build()
        };

        let rb = RigidBodyBuilder::dynamic()
            .translation(island.centroid.coords)
            .rotation(island.rot.scaled_axis())
            .build();
        let handle = self.bodies.insert(rb);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.island_bodies.insert(island.id, handle);
        Ok(handle)
    }

    /// Re-enable or break a joint by hand. Returns `false` for unknown handles.
    pub fn set_enabled(&mut self, handle: ConstraintHandle, enabled: bool) -> bool {
        let Some(joint_handle) = self.joint_of(handle) else {
            return false;
        };
        for (candidate, joint) in self.impulse_joints.iter_mut() {
            if candidate == joint_handle {
                joint.data.set_enabled(enabled);
                return true;
            }
        }
        false
    }

    /// Disable every enabled joint whose accumulated impulse exceeds its
    /// breaking threshold. Returns how many joints broke.
    pub fn break_overloaded(&mut self) -> usize {
        let mut broken = 0;
        for (handle, joint) in self.impulse_joints.iter_mut() {
            let Some(&threshold) = self.thresholds.get(&handle) else {
                continue;
            };
            if joint.data.is_enabled() && joint.impulses.norm() > threshold {
                joint.data.set_enabled(false);
                broken += 1;
            }
        }
        if broken > 0 {
            debug!(broken, "joints exceeded their breaking threshold");
        }
        broken
    }
}

/// Joint frame of `island`'s body with its origin at `anchor` and world axes.
fn anchor_frame(island: &Island, anchor: &Point3<Real>) -> Isometry3<Real> {
    let inv = island.rot.inverse();
    let local = inv * (anchor - island.centroid);
    Isometry3::from_parts(Translation3::from(local), inv)
}

impl PhysicsWorld for RapierWorld {
    fn create_breakable_constraint(
        &mut self,
        kind: ConstraintKind,
        a: &Island,
        b: &Island,
        threshold: Real,
    ) -> FractureResult<ConstraintHandle> {
        let body1 = self.ensure_body(a)?;
        let body2 = self.ensure_body(b)?;

        let anchor = nalgebra::center(&a.centroid, &b.centroid);
        let joint = match kind {
            ConstraintKind::Fixed => FixedJointBuilder::new()
                .local_frame1(anchor_frame(a, &anchor))
                .local_frame2(anchor_frame(b, &anchor))
                .build(),
        };
        let joint_handle = self.impulse_joints.insert(body1, body2, joint, true);

        let handle = ConstraintHandle(self.next);
        self.next += 1;
        self.joints.insert(handle, joint_handle);
        self.thresholds.insert(joint_handle, threshold);
        Ok(handle)
    }

    fn is_enabled(&self, handle: ConstraintHandle) -> bool {
        self.joint_of(handle)
            .and_then(|joint| self.impulse_joints.get(joint))
            .is_some_and(|joint| joint.data.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::IslandExtractor;
    use crate::mesh::MeshGraph;
    use crate::scene::ModifierId;
    use nalgebra::Matrix4;

    fn two_islands() -> Vec<Island> {
        let mesh = MeshGraph::grid_of_cubes(2, 1, 1, 1.0, 0.0);
        IslandExtractor::new(ModifierId::next(), &Matrix4::identity()).extract(&mesh)
    }

    #[test]
    fn bodies_sit_at_island_centroids() {
        let islands = two_islands();
        let mut world = RapierWorld::default();
        let handle = world
            .create_breakable_constraint(ConstraintKind::Fixed, &islands[0], &islands[1], 5.0)
            .expect("joint");

        assert_eq!(world.bodies.len(), 2);
        assert_eq!(world.colliders.len(), 2);
        assert!(world.is_enabled(handle));

        let body = world.body_of(islands[1].id).expect("body");
        let pos = world.bodies[body].translation();
        assert!((pos.x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn bodies_are_shared_between_joints() {
        let islands = two_islands();
        let mut world = RapierWorld::default();
        for _ in 0..2 {
            world
                .create_breakable_constraint(ConstraintKind::Fixed, &islands[0], &islands[1], 5.0)
                .expect("joint");
        }
        assert_eq!(world.bodies.len(), 2);
        assert_eq!(world.impulse_joints.len(), 2);
    }

    #[test]
    fn overloaded_joints_break() {
        let islands = two_islands();
        let mut world = RapierWorld::default();
        let handle = world
            .create_breakable_constraint(ConstraintKind::Fixed, &islands[0], &islands[1], 5.0)
            .expect("joint");

        assert_eq!(world.break_overloaded(), 0);
        for (_, joint) in world.impulse_joints.iter_mut() {
            joint.impulses[0] = 50.0;
        }
        assert_eq!(world.break_overloaded(), 1);
        assert!(!world.is_enabled(handle));

        assert!(world.set_enabled(handle, true));
        assert!(world.is_enabled(handle));
    }
}
