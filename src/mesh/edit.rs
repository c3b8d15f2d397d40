//! Copying, appending and deleting geometry.

use super::{MarkSet, MeshGraph};
use hashbrown::HashSet;

/// Old -> new index maps produced by operations that renumber a graph.
///
/// `None` means the element no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRemap {
    pub vertices: Vec<Option<usize>>,
    pub faces: Vec<Option<usize>>,
}

impl MeshGraph {
    /// Copy the marked vertices, edges and faces into a new graph.
    ///
    /// Vertices keep their relative order; the returned vector maps each copied
    /// vertex (by new index) back to its index in `self`.
    pub fn duplicate_marked(&self, marks: &MarkSet) -> (MeshGraph, Vec<usize>) {
        let mut out = MeshGraph::with_capacity(marks.vertex_count(), marks.face_count());
        let mut old_to_new = vec![None; self.vertex_count()];
        let mut new_to_old = Vec::with_capacity(marks.vertex_count());

        for (v, vertex) in self.vertices.iter().enumerate() {
            if marks.is_vertex_marked(v) {
                let nv = out.add_vertex(vertex.pos);
                out.vertices[nv].normal = vertex.normal;
                old_to_new[v] = Some(nv);
                new_to_old.push(v);
            }
        }

        for (e, edge) in self.edges().iter().enumerate() {
            if !marks.is_edge_marked(e) {
                continue;
            }
            if let (Some(a), Some(b)) = (old_to_new[edge.v1], old_to_new[edge.v2]) {
                out.add_edge(a, b);
            }
        }

        for (f, face) in self.faces().iter().enumerate() {
            if !marks.is_face_marked(f) {
                continue;
            }
            let verts: Option<Vec<usize>> = face.verts.iter().map(|&v| old_to_new[v]).collect();
            if let Some(verts) = verts {
                let nf = out.push_face_unchecked(verts);
                out.faces[nf].normal = face.normal;
            }
        }

        (out, new_to_old)
    }

    /// Append a copy of `other`'s geometry; returns the vertex offset.
    pub fn append(&mut self, other: &MeshGraph) -> usize {
        let offset = self.vertex_count();
        for vertex in &other.vertices {
            let v = self.add_vertex(vertex.pos);
            self.vertices[v].normal = vertex.normal;
        }
        for edge in other.edges() {
            self.add_edge(edge.v1 + offset, edge.v2 + offset);
        }
        for face in other.faces() {
            let nf = self.push_face_unchecked(face.verts.iter().map(|&v| v + offset).collect());
            self.faces[nf].normal = face.normal;
        }
        offset
    }

    /// Delete the marked faces, then every edge and vertex that belonged to a
    /// deleted face and is no longer used by anything that survived.
    pub fn delete_faces(&mut self, marks: &MarkSet) -> ElementRemap {
        let removed: HashSet<usize> = (0..self.face_count())
            .filter(|&f| marks.is_face_marked(f))
            .collect();
        let removable: HashSet<usize> = removed
            .iter()
            .flat_map(|&f| self.face(f).verts.iter().copied())
            .collect();
        let identity: Vec<usize> = (0..self.vertex_count()).collect();
        self.rebuild(&identity, &removed, &removable)
    }

    /// Rebuild the graph after collapsing vertices onto representatives.
    ///
    /// `target[v]` is the representative of `v` (itself when untouched). Faces in
    /// `removed_faces` are dropped, faces that collapse below 3 distinct
    /// vertices vanish, loose edges survive unless degenerate. A representative
    /// vertex is kept when still referenced, or when it is not `removable`.
    pub(crate) fn rebuild(
        &mut self,
        target: &[usize],
        removed_faces: &HashSet<usize>,
        removable: &HashSet<usize>,
    ) -> ElementRemap {
        let face_edges: HashSet<usize> = self
            .faces()
            .iter()
            .flat_map(|face| face.edges.iter().copied())
            .collect();

        let mut loops: Vec<(usize, Vec<usize>)> = Vec::with_capacity(self.face_count());
        for (f, face) in self.faces().iter().enumerate() {
            if removed_faces.contains(&f) {
                continue;
            }
            let mut verts: Vec<usize> = Vec::with_capacity(face.verts.len());
            for &v in &face.verts {
                let t = target[v];
                if verts.last() != Some(&t) {
                    verts.push(t);
                }
            }
            while verts.len() > 1 && verts.first() == verts.last() {
                verts.pop();
            }
            let distinct: HashSet<usize> = verts.iter().copied().collect();
            if verts.len() >= 3 && distinct.len() == verts.len() {
                loops.push((f, verts));
            }
        }

        let mut loose: Vec<(usize, usize)> = Vec::new();
        for (e, edge) in self.edges().iter().enumerate() {
            if face_edges.contains(&e) {
                continue;
            }
            let (a, b) = (target[edge.v1], target[edge.v2]);
            if a != b {
                loose.push((a, b));
            }
        }

        let mut used = vec![false; self.vertex_count()];
        for (_, verts) in &loops {
            for &v in verts {
                used[v] = true;
            }
        }
        for &(a, b) in &loose {
            used[a] = true;
            used[b] = true;
        }

        let mut out = MeshGraph::with_capacity(self.vertex_count(), loops.len());
        let mut rep_to_new = vec![None; self.vertex_count()];
        for (v, vertex) in self.vertices.iter().enumerate() {
            if target[v] == v && (used[v] || !removable.contains(&v)) {
                let nv = out.add_vertex(vertex.pos);
                out.vertices[nv].normal = vertex.normal;
                rep_to_new[v] = Some(nv);
            }
        }

        for &(a, b) in &loose {
            if let (Some(na), Some(nb)) = (rep_to_new[a], rep_to_new[b]) {
                out.add_edge(na, nb);
            }
        }

        let mut face_map = vec![None; self.face_count()];
        for (f, verts) in loops {
            let mapped: Option<Vec<usize>> = verts.iter().map(|&v| rep_to_new[v]).collect();
            if let Some(mapped) = mapped {
                face_map[f] = Some(out.push_face_unchecked(mapped));
            }
        }

        let vertex_map = (0..self.vertex_count())
            .map(|v| rep_to_new[target[v]])
            .collect();

        *self = out;

        ElementRemap {
            vertices: vertex_map,
            faces: face_map,
        }
    }
}
