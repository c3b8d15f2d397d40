mod support;

use approx::assert_relative_eq;
use hashbrown::HashSet;
use nalgebra::{Matrix4, Point3, Vector3};
use rbfracture::{
    MeshGraph,
    float_types::Real,
    island::{IslandExtractor, matrix_rotation},
    scene::ModifierId,
};

use crate::support::{extract, touching_row};

#[test]
fn islands_partition_the_vertices() {
    let mesh = MeshGraph::grid_of_cubes(3, 2, 2, 1.0, 0.25);
    let (_, islands) = extract(&mesh);
    assert_eq!(islands.len(), 12);

    let mut seen = HashSet::new();
    for island in &islands {
        for &v in &island.vertices {
            assert!(seen.insert(v), "vertex {v} claimed by two islands");
        }
    }
    assert_eq!(seen.len(), mesh.vertex_count());
}

#[test]
fn islands_follow_lowest_vertex_order() {
    let (owner, islands) = extract(&touching_row(4));
    for (i, island) in islands.iter().enumerate() {
        assert_eq!(island.id.index, i);
        assert_eq!(island.owner(), owner);
        assert_eq!(island.vertices[0], i * 8);
    }
}

#[test]
fn island_geometry_is_centred_on_its_centroid() {
    let mesh = touching_row(3);
    let (_, islands) = extract(&mesh);
    for (i, island) in islands.iter().enumerate() {
        assert_relative_eq!(
            island.centroid,
            Point3::new(i as Real + 0.5, 0.5, 0.5),
            epsilon = 1e-9
        );
        assert_eq!(island.physics_mesh.face_count(), 6);
        assert_eq!(island.vertex_count(), 8);

        let local = island.physics_mesh.area_weighted_centroid(None);
        assert_relative_eq!(local, Point3::origin(), epsilon = 1e-9);

        // start coordinates are untouched source positions
        for (local_v, &source_v) in island.vertices.iter().enumerate() {
            assert_eq!(island.start_coords[local_v], mesh.vertices[source_v].pos);
            assert!(source_v >= i * 8 && source_v < (i + 1) * 8);
        }
    }
}

#[test]
fn welded_mesh_is_a_single_island() {
    let mut mesh = touching_row(3);
    mesh.automerge_all(1e-5);
    let (_, islands) = extract(&mesh);
    assert_eq!(islands.len(), 1);
    assert_eq!(islands[0].vertex_count(), mesh.vertex_count());
}

#[test]
fn empty_mesh_has_no_islands() {
    let (_, islands) = extract(&MeshGraph::new());
    assert!(islands.is_empty());
}

#[test]
fn loose_vertices_become_point_islands() {
    let mut mesh = MeshGraph::cube(1.0);
    let loose = mesh.add_vertex(Point3::new(5.0, 5.0, 5.0));
    let (_, islands) = extract(&mesh);
    assert_eq!(islands.len(), 2);
    assert_eq!(islands[1].vertices, vec![loose]);
    assert_eq!(islands[1].physics_mesh.face_count(), 0);
}

#[test]
fn islands_carry_the_object_rotation() {
    let rotation = Matrix4::from_scaled_axis(Vector3::z() * 0.5);
    let scaled = rotation * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 3.0, 4.0));
    let islands =
        IslandExtractor::new(ModifierId::next(), &scaled).extract(&touching_row(2));
    let expected = matrix_rotation(&rotation);
    for island in &islands {
        assert!(island.rot.angle_to(&expected) < 1e-6);
    }
}
