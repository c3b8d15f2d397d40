//! Transient element marks scoped to a single algorithm invocation.
//!
//! Marks never live on the mesh elements themselves, so one pass cannot
//! observe another pass's leftovers.

use super::MeshGraph;
use hashbrown::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    verts: HashSet<usize>,
    edges: HashSet<usize>,
    faces: HashSet<usize>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the vertex was not marked before.
    #[inline]
    pub fn mark_vertex(&mut self, v: usize) -> bool {
        self.verts.insert(v)
    }

    #[inline]
    pub fn unmark_vertex(&mut self, v: usize) -> bool {
        self.verts.remove(&v)
    }

    #[inline]
    pub fn is_vertex_marked(&self, v: usize) -> bool {
        self.verts.contains(&v)
    }

    #[inline]
    pub fn mark_edge(&mut self, e: usize) -> bool {
        self.edges.insert(e)
    }

    #[inline]
    pub fn is_edge_marked(&self, e: usize) -> bool {
        self.edges.contains(&e)
    }

    #[inline]
    pub fn mark_face(&mut self, f: usize) -> bool {
        self.faces.insert(f)
    }

    #[inline]
    pub fn unmark_face(&mut self, f: usize) -> bool {
        self.faces.remove(&f)
    }

    #[inline]
    pub fn is_face_marked(&self, f: usize) -> bool {
        self.faces.contains(&f)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Marked vertices in ascending index order.
    pub fn sorted_vertices(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.verts.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// Marked faces in ascending index order.
    pub fn sorted_faces(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.faces.iter().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn clear(&mut self) {
        self.verts.clear();
        self.edges.clear();
        self.faces.clear();
    }

    /// Carry face marks through a remapping, dropping faces that vanished.
    pub fn remap_faces(&mut self, face_map: &[Option<usize>]) {
        self.faces = self
            .faces
            .iter()
            .filter_map(|&f| face_map.get(f).copied().flatten())
            .collect();
    }
}

impl MeshGraph {
    /// Flush vertex marks to edges and faces.
    ///
    /// An edge is marked iff both endpoints are marked, a face iff every loop
    /// vertex is marked. Edge and face marks that do not satisfy this are cleared.
    pub fn flush_vertex_marks(&self, marks: &mut MarkSet) {
        marks.edges.clear();
        marks.faces.clear();

        for (e, edge) in self.edges().iter().enumerate() {
            if marks.is_vertex_marked(edge.v1) && marks.is_vertex_marked(edge.v2) {
                marks.edges.insert(e);
            }
        }

        for (f, face) in self.faces().iter().enumerate() {
            if face.verts.iter().all(|&v| marks.is_vertex_marked(v)) {
                marks.faces.insert(f);
            }
        }
    }
}
