//! `MeshGraph`: a mutable polygonal mesh with explicit edges and vertex adjacency.
//!
//! Faces are ordered loops of vertex indices. Every face loop is backed by
//! shared edges (one edge per unordered vertex pair), so connectivity queries
//! (`edges_of_vertex`, `faces_of_vertex`) are O(1) lookups.

use crate::errors::{FractureError, FractureResult};
use crate::float_types::{
    Real,
    parry3d::shape::TriMesh,
};
use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3};

pub mod edit;
pub mod marks;
pub mod merge;
pub mod shapes;
pub mod walker;

pub use marks::MarkSet;
pub use walker::ShellWalker;

/// A vertex of a [`MeshGraph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphVertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl GraphVertex {
    /// Create a vertex with sanitized coordinates
    #[inline]
    pub fn new(pos: Point3<Real>) -> Self {
        let pos = pos.map(|c| if c.is_finite() { c } else { 0.0 });
        GraphVertex {
            pos,
            normal: Vector3::zeros(),
        }
    }
}

/// An edge between two vertices, stored with `v1 < v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub v1: usize,
    pub v2: usize,
}

impl GraphEdge {
    #[inline]
    pub const fn other(&self, v: usize) -> usize {
        if self.v1 == v { self.v2 } else { self.v1 }
    }
}

/// A polygonal face: an ordered vertex loop, the matching edge loop and a normal.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFace {
    pub verts: Vec<usize>,
    pub edges: Vec<usize>,
    pub normal: Vector3<Real>,
}

impl GraphFace {
    /// Return an iterator over paired indices each forming an edge of the loop
    pub fn loop_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.verts
            .iter()
            .zip(self.verts.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshGraph {
    /// Vertex positions and normals
    pub vertices: Vec<GraphVertex>,

    edges: Vec<GraphEdge>,
    faces: Vec<GraphFace>,

    /// Unordered vertex pair -> edge index
    edge_lookup: HashMap<(usize, usize), usize>,
    vert_edges: Vec<Vec<usize>>,
    vert_faces: Vec<Vec<usize>>,
}

#[inline]
const fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

impl MeshGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        MeshGraph {
            vertices: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(vertices + faces),
            faces: Vec::with_capacity(faces),
            edge_lookup: HashMap::with_capacity(vertices + faces),
            vert_edges: Vec::with_capacity(vertices),
            vert_faces: Vec::with_capacity(vertices),
        }
    }

    /// Build a graph from raw positions and face loops.
    ///
    /// ## Errors
    /// If a face has fewer than 3 vertices, references a vertex out of range,
    /// or visits a vertex twice.
    pub fn from_polygons(
        positions: &[Point3<Real>],
        faces: &[Vec<usize>],
    ) -> FractureResult<MeshGraph> {
        let mut graph = MeshGraph::with_capacity(positions.len(), faces.len());
        for &pos in positions {
            graph.add_vertex(pos);
        }
        for face in faces {
            graph.add_face(face)?;
        }
        Ok(graph)
    }

    /// Positions and face loops, the persisted form of the graph.
    pub fn to_polygons(&self) -> (Vec<Point3<Real>>, Vec<Vec<usize>>) {
        (
            self.vertices.iter().map(|v| v.pos).collect(),
            self.faces.iter().map(|f| f.verts.clone()).collect(),
        )
    }

    pub fn add_vertex(&mut self, pos: Point3<Real>) -> usize {
        self.vertices.push(GraphVertex::new(pos));
        self.vert_edges.push(Vec::new());
        self.vert_faces.push(Vec::new());
        self.vertices.len() - 1
    }

    /// Return the edge joining `a` and `b`, creating it if needed.
    ///
    /// # Panics
    /// If `a == b` or either index is out of range.
    pub fn add_edge(&mut self, a: usize, b: usize) -> usize {
        assert!(a != b, "edge endpoints must differ");
        assert!(
            a < self.vertices.len() && b < self.vertices.len(),
            "edge endpoint out of range"
        );
        let key = edge_key(a, b);
        if let Some(&e) = self.edge_lookup.get(&key) {
            return e;
        }
        let e = self.edges.len();
        self.edges.push(GraphEdge { v1: key.0, v2: key.1 });
        self.edge_lookup.insert(key, e);
        self.vert_edges[key.0].push(e);
        self.vert_edges[key.1].push(e);
        e
    }

    /// Append a face from a vertex loop, creating the edges it needs.
    pub fn add_face(&mut self, verts: &[usize]) -> FractureResult<usize> {
        let face = self.faces.len();
        if verts.len() < 3 {
            return Err(FractureError::DegenerateFace {
                face,
                len: verts.len(),
            });
        }
        for (i, &v) in verts.iter().enumerate() {
            if v >= self.vertices.len() {
                return Err(FractureError::FaceIndexOutOfRange {
                    face,
                    index: v,
                    vertex_count: self.vertices.len(),
                });
            }
            if verts[..i].contains(&v) {
                return Err(FractureError::DuplicateFaceVertex { face, index: v });
            }
        }
        Ok(self.push_face_unchecked(verts.to_vec()))
    }

    /// Append a loop that is already known to be valid.
    pub(crate) fn push_face_unchecked(&mut self, verts: Vec<usize>) -> usize {
        let f = self.faces.len();
        let n = verts.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(verts[i], verts[(i + 1) % n]));
        }
        for &v in &verts {
            self.vert_faces[v].push(f);
        }
        let normal = self.newell_normal(&verts);
        self.faces.push(GraphFace {
            verts,
            edges,
            normal,
        });
        f
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    #[inline]
    pub fn faces(&self) -> &[GraphFace] {
        &self.faces
    }

    #[inline]
    pub fn edge(&self, e: usize) -> &GraphEdge {
        &self.edges[e]
    }

    #[inline]
    pub fn face(&self, f: usize) -> &GraphFace {
        &self.faces[f]
    }

    /// Edges incident to `v`, in creation order.
    #[inline]
    pub fn edges_of_vertex(&self, v: usize) -> &[usize] {
        &self.vert_edges[v]
    }

    /// Faces using `v` in their loop, in creation order.
    #[inline]
    pub fn faces_of_vertex(&self, v: usize) -> &[usize] {
        &self.vert_faces[v]
    }

    /// Edge index joining `a` and `b`, if any.
    #[inline]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    /// Mean of the face's loop positions.
    pub fn face_center_mean(&self, f: usize) -> Point3<Real> {
        let face = &self.faces[f];
        let sum: Vector3<Real> = face.verts.iter().map(|&v| self.vertices[v].pos.coords).sum();
        Point3::from(sum / face.verts.len() as Real)
    }

    /// Center of the face's axis aligned bounding box.
    pub fn face_center_bounds(&self, f: usize) -> Point3<Real> {
        let face = &self.faces[f];
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
        for &v in &face.verts {
            let p = self.vertices[v].pos;
            mins = mins.inf(&p);
            maxs = maxs.sup(&p);
        }
        nalgebra::center(&mins, &maxs)
    }

    /// Area of the face, fan-triangulated from its first vertex.
    pub fn face_area(&self, f: usize) -> Real {
        let verts = &self.faces[f].verts;
        let p0 = self.vertices[verts[0]].pos;
        let mut cross: Vector3<Real> = Vector3::zeros();
        for i in 1..verts.len() - 1 {
            let p1 = self.vertices[verts[i]].pos;
            let p2 = self.vertices[verts[i + 1]].pos;
            cross += (p1 - p0).cross(&(p2 - p0));
        }
        cross.norm() * 0.5
    }

    /// Area weighted average of face centers, optionally restricted to marked faces.
    ///
    /// Returns the origin when no face contributes any area.
    pub fn area_weighted_centroid(&self, tagged: Option<&MarkSet>) -> Point3<Real> {
        let mut cent: Vector3<Real> = Vector3::zeros();
        let mut total_area = 0.0;

        for f in 0..self.faces.len() {
            if tagged.is_some_and(|marks| !marks.is_face_marked(f)) {
                continue;
            }
            let area = self.face_area(f);
            cent += self.face_center_mean(f).coords * area;
            total_area += area;
        }

        if total_area > Real::EPSILON {
            Point3::from(cent / total_area)
        } else {
            Point3::origin()
        }
    }

    /// Normal of a vertex loop by Newell's method, +Z for zero-area loops.
    fn newell_normal(&self, verts: &[usize]) -> Vector3<Real> {
        let mut normal: Vector3<Real> = Vector3::zeros();
        let n = verts.len();
        for i in 0..n {
            let cur = self.vertices[verts[i]].pos;
            let next = self.vertices[verts[(i + 1) % n]].pos;
            normal.x += (cur.y - next.y) * (cur.z + next.z);
            normal.y += (cur.z - next.z) * (cur.x + next.x);
            normal.z += (cur.x - next.x) * (cur.y + next.y);
        }
        let len = normal.norm();
        if len > Real::EPSILON {
            normal / len
        } else {
            Vector3::z()
        }
    }

    /// Recompute face normals, then area weighted vertex normals.
    pub fn recalc_normals(&mut self) {
        for f in 0..self.faces.len() {
            self.faces[f].normal = self.newell_normal(&self.faces[f].verts);
        }

        self.vertices
            .iter_mut()
            .for_each(|vertex| vertex.normal = Vector3::zeros());

        for f in 0..self.faces.len() {
            let weighted = self.faces[f].normal * self.face_area(f);
            for &v in &self.faces[f].verts {
                self.vertices[v].normal += weighted;
            }
        }

        self.vertices.iter_mut().for_each(|vertex| {
            let norm = vertex.normal.norm();
            if norm > Real::EPSILON {
                vertex.normal /= norm;
            } else {
                vertex.normal = Vector3::z();
            }
        });
    }

    pub fn translate(&mut self, offset: &Vector3<Real>) {
        for v in &mut self.vertices {
            v.pos += offset;
        }
    }

    /// Apply a 4x4 transform to all vertex positions and refresh normals.
    pub fn transform(&mut self, mat: &Matrix4<Real>) {
        for v in &mut self.vertices {
            let hp = mat * v.pos.to_homogeneous();
            // If homogeneous w is invalid, fall back to original position.
            v.pos = Point3::from_homogeneous(hp).unwrap_or(v.pos);
        }
        self.recalc_normals();
    }

    /// Fan triangulation of every face, as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.faces.iter().flat_map(|face| {
            (1..face.verts.len() - 1).map(move |i| [face.verts[0], face.verts[i], face.verts[i + 1]])
        })
    }

    /// Convert the faces to a Parry `TriMesh`.
    ///
    /// ## Errors
    /// If the graph has no faces, or Parry returns a `TriMeshBuilderError`
    pub fn to_trimesh(&self) -> FractureResult<TriMesh> {
        let vertices: Vec<Point3<Real>> = self.vertices.iter().map(|v| v.pos).collect();
        let indices: Vec<[u32; 3]> = self
            .triangles()
            .map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
            .collect();
        Ok(TriMesh::new(vertices, indices)?)
    }
}
