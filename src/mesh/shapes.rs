//! Primitive shapes as `MeshGraph`s

use super::MeshGraph;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

impl MeshGraph {
    /// Axis aligned box spanning `[0, width] x [0, length] x [0, height]`.
    ///
    /// ```text
    /// Vertex Layout:
    ///     4-------5
    ///    /|      /|
    ///   0-------1 |
    ///   | |     | |
    ///   | 7-----|-6
    ///   |/      |/
    ///   3-------2
    /// ```
    ///
    /// Faces, in order: bottom (-Z), top (+Z), front (-Y), back (+Y),
    /// left (-X), right (+X), all wound CCW seen from outside.
    pub fn cuboid(width: Real, length: Real, height: Real) -> MeshGraph {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),       // 0: origin
            Point3::new(width, 0.0, 0.0),     // 1: +X
            Point3::new(width, length, 0.0),  // 2: +X+Y
            Point3::new(0.0, length, 0.0),    // 3: +Y
            Point3::new(0.0, 0.0, height),    // 4: +Z
            Point3::new(width, 0.0, height),  // 5: +X+Z
            Point3::new(width, length, height), // 6: +X+Y+Z
            Point3::new(0.0, length, height), // 7: +Y+Z
        ];
        let loops: [[usize; 4]; 6] = [
            [0, 3, 2, 1], // Bottom
            [4, 5, 6, 7], // Top
            [0, 1, 5, 4], // Front
            [3, 7, 6, 2], // Back
            [0, 4, 7, 3], // Left
            [1, 2, 6, 5], // Right
        ];

        let mut mesh = MeshGraph::with_capacity(corners.len(), loops.len());
        for corner in corners {
            mesh.add_vertex(corner);
        }
        for face in loops {
            mesh.push_face_unchecked(face.to_vec());
        }
        mesh.recalc_normals();
        mesh
    }

    pub fn cube(size: Real) -> MeshGraph {
        Self::cuboid(size, size, size)
    }

    /// A grid of `nx * ny * nz` separate cubes of edge length `size`, spaced
    /// `gap` apart. A zero gap makes neighbouring cubes touch face to face.
    ///
    /// Cubes share no vertices, so each one is its own connected shell. Cubes
    /// are emitted x fastest, then y, then z.
    pub fn grid_of_cubes(nx: usize, ny: usize, nz: usize, size: Real, gap: Real) -> MeshGraph {
        let step = size + gap;
        let count = nx * ny * nz;
        let mut mesh = MeshGraph::with_capacity(count * 8, count * 6);
        let unit = MeshGraph::cube(size);

        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let mut cell = unit.clone();
                    cell.translate(&Vector3::new(
                        i as Real * step,
                        j as Real * step,
                        k as Real * step,
                    ));
                    mesh.append(&cell);
                }
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_faces_point_outward() {
        let mesh = MeshGraph::cuboid(2.0, 3.0, 4.0);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 6);

        let expected = [
            -Vector3::z(),
            Vector3::z(),
            -Vector3::y(),
            Vector3::y(),
            -Vector3::x(),
            Vector3::x(),
        ];
        for (f, normal) in expected.iter().enumerate() {
            assert_relative_eq!(mesh.face(f).normal, *normal, epsilon = 1e-12);
        }
        assert_relative_eq!(
            mesh.area_weighted_centroid(None),
            Point3::new(1.0, 1.5, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn grid_keeps_cubes_unwelded() {
        let mesh = MeshGraph::grid_of_cubes(2, 2, 1, 1.0, 0.5);
        assert_eq!(mesh.vertex_count(), 32);
        assert_eq!(mesh.face_count(), 24);
        assert_relative_eq!(mesh.vertices[8].pos, Point3::new(1.5, 0.0, 0.0));
        assert_relative_eq!(mesh.vertices[16].pos, Point3::new(0.0, 1.5, 0.0));
    }
}
