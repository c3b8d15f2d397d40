//! Shell walk: visit every edge connected to a seed vertex.

use super::MeshGraph;
use hashbrown::HashSet;
use std::collections::VecDeque;

/// Breadth-first walker yielding the edges of the shell containing a seed vertex.
///
/// A seed without edges yields nothing.
pub struct ShellWalker<'a> {
    mesh: &'a MeshGraph,
    queue: VecDeque<usize>,
    visited_edges: HashSet<usize>,
    visited_verts: HashSet<usize>,
}

impl<'a> ShellWalker<'a> {
    pub fn begin(mesh: &'a MeshGraph, seed: usize) -> Self {
        let mut walker = ShellWalker {
            mesh,
            queue: VecDeque::new(),
            visited_edges: HashSet::new(),
            visited_verts: HashSet::new(),
        };
        if seed < mesh.vertex_count() {
            walker.enqueue_vertex(seed);
        }
        walker
    }

    fn enqueue_vertex(&mut self, v: usize) {
        if !self.visited_verts.insert(v) {
            return;
        }
        for &e in self.mesh.edges_of_vertex(v) {
            if self.visited_edges.insert(e) {
                self.queue.push_back(e);
            }
        }
    }
}

impl Iterator for ShellWalker<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let e = self.queue.pop_front()?;
        let edge = *self.mesh.edge(e);
        self.enqueue_vertex(edge.v1);
        self.enqueue_vertex(edge.v2);
        Some(e)
    }
}
