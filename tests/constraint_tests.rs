mod support;

use nalgebra::{Matrix4, Vector3};
use rbfracture::{
    ConstraintGraphBuilder, FractureModifier, FractureSettings, IslandSource, MeshGraph,
    physics::BookkeepingWorld,
    scene::{ConstraintGroup, EvalContext, GroupId, ModifierStacks},
};

use crate::support::{evaluated_peer, extract, seam_settings, touching_row, translated};

#[test]
fn grid_neighbours_share_one_constraint_each() {
    // 2x2 cubes: four face neighbours and two diagonal edge neighbours
    let settings = FractureSettings::default().with_use_constraints(true);
    let mesh = MeshGraph::grid_of_cubes(2, 2, 1, 1.0, 0.0);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();

    let graph = ConstraintGraphBuilder::new(&settings, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);

    assert_eq!(graph.constraints.len(), 6);
    for (i, a) in graph.constraints.iter().enumerate() {
        assert_ne!(a.mi1, a.mi2);
        for b in &graph.constraints[i + 1..] {
            assert!(!a.connects(b.mi1, b.mi2), "duplicate constraint");
        }
    }
}

#[test]
fn row_connects_only_neighbours() {
    let settings = FractureSettings::default().with_use_constraints(true);
    let mesh = touching_row(3);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();

    let graph = ConstraintGraphBuilder::new(&settings, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);

    assert_eq!(graph.constraints.len(), 2);
    assert!(graph.constraints.iter().any(|c| c.connects(islands[0].id, islands[1].id)));
    assert!(graph.constraints.iter().any(|c| c.connects(islands[1].id, islands[2].id)));
    assert!(!graph.constraints.iter().any(|c| c.connects(islands[0].id, islands[2].id)));
}

#[test]
fn seams_pair_antiparallel_faces_of_different_islands() {
    let settings = seam_settings();
    let mesh = MeshGraph::grid_of_cubes(2, 2, 1, 1.0, 0.0);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();

    let graph = ConstraintGraphBuilder::new(&settings, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);

    assert_eq!(graph.selected_pairs.len(), 4);
    assert_eq!(graph.selected_faces, 8);
    for pair in &graph.selected_pairs {
        let [f, g] = pair.faces;
        let sum = mesh.face(f).normal + mesh.face(g).normal;
        assert!(sum.norm() < 1e-9);
        assert_ne!(pair.islands.0, pair.islands.1);
    }
}

#[test]
fn builds_are_repeatable() {
    let settings = seam_settings();
    let mesh = touching_row(3);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();
    let builder = ConstraintGraphBuilder::new(&settings, owner, &mesh, true);

    let first = builder.build(IslandSource { islands: &islands, world: &world }, &[]);
    let second = builder.build(IslandSource { islands: &islands, world: &world }, &[]);
    assert_eq!(first, second);
}

#[test]
fn contact_distance_bridges_small_gaps() {
    let mesh = MeshGraph::grid_of_cubes(2, 1, 1, 1.0, 0.001);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();

    let tight = FractureSettings::default().with_use_constraints(true);
    let graph = ConstraintGraphBuilder::new(&tight, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);
    assert!(graph.constraints.is_empty());

    let loose = tight.with_contact_dist(0.01);
    let graph = ConstraintGraphBuilder::new(&loose, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);
    assert_eq!(graph.constraints.len(), 1);
}

#[test]
fn group_peers_use_group_threshold() {
    let mut stacks = ModifierStacks::new();
    let peer_object = translated(2, Vector3::new(1.0, 0.0, 0.0));
    let peer_id = evaluated_peer(
        &mut stacks,
        &peer_object,
        FractureSettings::default(),
        &MeshGraph::cube(1.0),
    );

    let groups = [ConstraintGroup::new(GroupId(7), vec![peer_object.id])];
    let object = translated(1, Vector3::zeros());
    let settings = FractureSettings::default()
        .with_use_constraints(true)
        .with_constraint_group(Some(GroupId(7)))
        .with_group_breaking_threshold(2.5);
    let mut modifier = FractureModifier::new(settings);

    let ctx = EvalContext::standalone(&object)
        .with_groups(&groups)
        .with_stacks(&stacks);
    modifier.apply(&ctx, &MeshGraph::cube(1.0));

    assert_eq!(modifier.constraints().len(), 1);
    let con = &modifier.constraints()[0];
    assert_eq!(con.breaking_threshold, 2.5);
    assert_ne!(con.mi1.modifier, con.mi2.modifier);
    assert!(con.mi1.modifier == peer_id || con.mi2.modifier == peer_id);

    // the peer island is found through the stacks when realizing
    let mut world = BookkeepingWorld::new();
    let created = modifier
        .realize_constraints(Some(&stacks), &mut world)
        .expect("bookkeeping never fails");
    assert_eq!(created, 1);
    assert_eq!(world.len(), 1);
}

#[test]
fn group_members_without_auto_merge_build_no_constraints() {
    let mut stacks = ModifierStacks::new();
    let peer_object = translated(2, Vector3::new(1.0, 0.0, 0.0));
    evaluated_peer(&mut stacks, &peer_object, FractureSettings::default(), &MeshGraph::cube(1.0));

    let object = translated(1, Vector3::zeros());
    let groups = [ConstraintGroup::new(GroupId(7), vec![object.id, peer_object.id])];
    let settings = FractureSettings::default()
        .with_use_constraints(true)
        .with_constraint_group(Some(GroupId(7)));
    let mut modifier = FractureModifier::new(settings);

    let ctx = EvalContext::standalone(&object)
        .with_groups(&groups)
        .with_stacks(&stacks);
    modifier.apply(&ctx, &touching_row(2));

    assert_eq!(modifier.islands().len(), 2);
    assert!(modifier.constraints().is_empty());
}

#[test]
fn missing_group_is_ignored() {
    let object = translated(1, Vector3::zeros());
    let settings = FractureSettings::default()
        .with_use_constraints(true)
        .with_constraint_group(Some(GroupId(99)));
    let mut modifier = FractureModifier::new(settings);
    modifier.apply(&EvalContext::standalone(&object), &touching_row(2));
    assert_eq!(modifier.constraints().len(), 1);
}

#[test]
fn a_single_shared_corner_is_enough() {
    let settings = FractureSettings::default().with_use_constraints(true);
    let mut mesh = MeshGraph::cube(1.0);
    let mut other = MeshGraph::cube(1.0);
    other.translate(&Vector3::new(1.0, 1.0, 1.0));
    mesh.append(&other);
    let (owner, islands) = extract(&mesh);
    let world = Matrix4::identity();

    let graph = ConstraintGraphBuilder::new(&settings, owner, &mesh, true)
        .build(IslandSource { islands: &islands, world: &world }, &[]);
    assert_eq!(islands.len(), 2);
    assert_eq!(graph.constraints.len(), 1);
    assert_eq!(graph.constraints[0].breaking_threshold, settings.breaking_threshold);
}
