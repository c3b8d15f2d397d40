//! Connected-component extraction.
//!
//! An [`Island`] is one connected shell of the input mesh, copied into its own
//! [`MeshGraph`] and re-centred on its area weighted centroid. Islands are what
//! the physics collaborator simulates as individual rigid bodies.

use crate::float_types::Real;
use crate::mesh::{MarkSet, MeshGraph, ShellWalker};
use crate::scene::ModifierId;
use hashbrown::HashSet;
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion};
use tracing::{debug, info};

/// Weak reference to an island: its owning modifier and position in that
/// modifier's island list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IslandId {
    pub modifier: ModifierId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Island {
    pub id: IslandId,
    /// The component's geometry, translated so `centroid` sits at the origin
    pub physics_mesh: MeshGraph,
    /// Source mesh vertex of each `physics_mesh` vertex
    pub vertices: Vec<usize>,
    /// Source positions captured at extraction time, parallel to `vertices`
    pub start_coords: Vec<Point3<Real>>,
    pub centroid: Point3<Real>,
    /// Rotation of the owning object when the island was extracted
    pub rot: UnitQuaternion<Real>,
}

impl Island {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn owner(&self) -> ModifierId {
        self.id.modifier
    }
}

/// Rotation part of an object matrix, with scale divided out.
pub fn matrix_rotation(mat: &Matrix4<Real>) -> UnitQuaternion<Real> {
    let mut basis: Matrix3<Real> = mat.fixed_view::<3, 3>(0, 0).into_owned();
    for mut column in basis.column_iter_mut() {
        let norm = column.norm();
        if norm > Real::EPSILON {
            column /= norm;
        }
    }
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&basis))
}

/// Splits a mesh into its connected components.
#[derive(Debug, Clone)]
pub struct IslandExtractor {
    owner: ModifierId,
    rot: UnitQuaternion<Real>,
}

impl IslandExtractor {
    pub fn new(owner: ModifierId, object_matrix: &Matrix4<Real>) -> Self {
        IslandExtractor {
            owner,
            rot: matrix_rotation(object_matrix),
        }
    }

    /// One island per connected shell of `mesh`, ordered by their lowest
    /// vertex index. An empty mesh gives no islands.
    pub fn extract(&self, mesh: &MeshGraph) -> Vec<Island> {
        let total = mesh.vertex_count();
        let mut visited: HashSet<usize> = HashSet::with_capacity(total);
        let mut islands = Vec::new();
        let mut marks = MarkSet::new();
        let mut tot = 0;
        let mut cursor = 0;

        // every pass claims at least its seed, so `total` passes always suffice
        for _ in 0..total {
            while cursor < total && visited.contains(&cursor) {
                cursor += 1;
            }
            if cursor == total {
                break;
            }
            let seed = cursor;

            marks.clear();
            // the seed is claimed explicitly in case it has no edges
            if visited.insert(seed) {
                marks.mark_vertex(seed);
                tot += 1;
            }
            for e in ShellWalker::begin(mesh, seed) {
                let edge = *mesh.edge(e);
                for v in [edge.v1, edge.v2] {
                    if visited.insert(v) {
                        marks.mark_vertex(v);
                        tot += 1;
                    }
                }
            }
            mesh.flush_vertex_marks(&mut marks);

            let island = self.separate_marked(mesh, &marks, islands.len());
            debug!(
                island = island.id.index,
                vertices = island.vertex_count(),
                faces = island.physics_mesh.face_count(),
                centroid = ?island.centroid,
                "separated island"
            );
            islands.push(island);

            if tot >= total && islands.len() > 1 {
                break;
            }
        }

        info!(islands = islands.len(), vertices = total, "extracted islands");
        islands
    }

    fn separate_marked(&self, mesh: &MeshGraph, marks: &MarkSet, index: usize) -> Island {
        let (mut physics_mesh, vertices) = mesh.duplicate_marked(marks);
        let centroid = physics_mesh.area_weighted_centroid(None);
        physics_mesh.translate(&-centroid.coords);
        physics_mesh.recalc_normals();

        let start_coords = vertices.iter().map(|&v| mesh.vertices[v].pos).collect();

        Island {
            id: IslandId {
                modifier: self.owner,
                index,
            },
            physics_mesh,
            vertices,
            start_coords,
            centroid,
            rot: self.rot,
        }
    }
}
