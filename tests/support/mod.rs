//! Test support library
//! Provides scene builders & small helpers shared by the integration tests.
#![allow(dead_code)]

use nalgebra::{Matrix4, Vector3};
use rbfracture::{
    FractureModifier, FractureSettings, MeshGraph,
    float_types::Real,
    island::{Island, IslandExtractor},
    scene::{EvalContext, ModifierId, ModifierStacks, ObjectId, ObjectInfo},
};

pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// `n` unit cubes in a row along +X, each touching the next face to face.
pub fn touching_row(n: usize) -> MeshGraph {
    MeshGraph::grid_of_cubes(n, 1, 1, 1.0, 0.0)
}

/// Islands of `mesh` for a fresh owner with an identity object matrix.
pub fn extract(mesh: &MeshGraph) -> (ModifierId, Vec<Island>) {
    let owner = ModifierId::next();
    let islands = IslandExtractor::new(owner, &Matrix4::identity()).extract(mesh);
    (owner, islands)
}

/// Settings with constraints and auto-merge switched on.
pub fn seam_settings() -> FractureSettings {
    FractureSettings::default()
        .with_use_constraints(true)
        .with_auto_merge(true)
}

pub fn translated(object: u64, offset: Vector3<Real>) -> ObjectInfo {
    ObjectInfo::new(ObjectId(object)).with_world(Matrix4::new_translation(&offset))
}

/// Evaluate a fresh modifier on `mesh` for `object` and park it in `stacks`.
pub fn evaluated_peer(
    stacks: &mut ModifierStacks,
    object: &ObjectInfo,
    settings: FractureSettings,
    mesh: &MeshGraph,
) -> ModifierId {
    let mut modifier = FractureModifier::new(settings);
    modifier.apply(&EvalContext::standalone(object), mesh);
    let id = modifier.id();
    stacks.entry(object.id).or_default().push(modifier);
    id
}
