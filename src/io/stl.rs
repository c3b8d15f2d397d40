use crate::errors::FractureResult;
use crate::float_types::Real;
use crate::mesh::MeshGraph;
use nalgebra::Point3;
use std::io::Cursor;
use tracing::warn;

impl MeshGraph {
    /// Convert this graph to an **ASCII STL** string with the given `name`.
    ///
    /// Faces are fan-triangulated; each facet carries its face normal.
    ///
    /// ```rust
    /// # use rbfracture::mesh::MeshGraph;
    /// let mesh = MeshGraph::cube(1.0);
    /// let text = mesh.to_stl_ascii("my_solid");
    /// assert!(text.starts_with("solid my_solid"));
    /// ```
    pub fn to_stl_ascii(&self, name: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("solid {name}\n"));

        for face in self.faces() {
            let n = face.normal;
            for i in 1..face.verts.len() - 1 {
                out.push_str(&format!(
                    "  facet normal {:.6} {:.6} {:.6}\n",
                    n.x, n.y, n.z
                ));
                out.push_str("    outer loop\n");
                for v in [face.verts[0], face.verts[i], face.verts[i + 1]] {
                    let p = self.vertices[v].pos;
                    out.push_str(&format!(
                        "      vertex {:.6} {:.6} {:.6}\n",
                        p.x, p.y, p.z
                    ));
                }
                out.push_str("    endloop\n");
                out.push_str("  endfacet\n");
            }
        }

        out.push_str(&format!("endsolid {name}\n"));
        out
    }

    /// Convert this graph to a **binary STL** byte vector.
    pub fn to_stl_binary(&self) -> FractureResult<Vec<u8>> {
        use stl_io::{Normal, Triangle, Vertex, write_stl};

        let mut triangles = Vec::<Triangle>::new();
        for face in self.faces() {
            let n = face.normal;
            for i in 1..face.verts.len() - 1 {
                #[allow(clippy::unnecessary_cast)]
                triangles.push(Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [face.verts[0], face.verts[i], face.verts[i + 1]].map(|v| {
                        let p = self.vertices[v].pos;
                        Vertex::new([p.x as f32, p.y as f32, p.z as f32])
                    }),
                });
            }
        }

        let mut cursor = Cursor::new(Vec::new());
        write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }

    /// Read an ASCII or binary STL into a graph of triangles.
    ///
    /// stl_io merges identical positions, so touching triangles share vertices.
    /// Triangles that reference one vertex twice are skipped.
    pub fn from_stl(data: &[u8]) -> FractureResult<MeshGraph> {
        let mut cursor = Cursor::new(data);
        let stl = stl_io::read_stl(&mut cursor)?;

        let positions: Vec<Point3<Real>> = stl
            .vertices
            .iter()
            .map(|v| Point3::new(v[0] as Real, v[1] as Real, v[2] as Real))
            .collect();
        let mut mesh = MeshGraph::with_capacity(positions.len(), stl.faces.len());
        for pos in positions {
            mesh.add_vertex(pos);
        }

        let mut skipped = 0;
        for tri in &stl.faces {
            if mesh.add_face(&tri.vertices).is_err() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped degenerate STL triangles");
        }
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_stl_keeps_shape() {
        let mesh = MeshGraph::cube(2.0);
        let bytes = mesh.to_stl_binary().expect("write");
        let back = MeshGraph::from_stl(&bytes).expect("read");
        assert_eq!(back.face_count(), 12);
        assert_eq!(back.vertex_count(), 8);
        assert!((back.area_weighted_centroid(None).x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ascii_stl_has_one_facet_per_triangle() {
        let text = MeshGraph::cube(1.0).to_stl_ascii("cube");
        assert_eq!(text.matches("facet normal").count(), 12);
        assert!(text.trim_end().ends_with("endsolid cube"));
    }
}
