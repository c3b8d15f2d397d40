//! Near-coincident vertex detection and welding.

use super::MeshGraph;
use super::edit::ElementRemap;
use crate::float_types::Real;
use hashbrown::HashSet;

impl MeshGraph {
    /// Find vertices among `candidates` lying within `dist` of another candidate.
    ///
    /// Returns `(duplicate, target)` pairs. Candidates are swept in order of
    /// `x + y + z` (ties by index), so for exactly coincident vertices the lower
    /// index becomes the target. A vertex already claimed as a duplicate is
    /// never used as a target. The distance test is inclusive.
    pub fn find_doubles(&self, candidates: &[usize], dist: Real) -> Vec<(usize, usize)> {
        let mut sorted: Vec<(Real, usize)> = candidates
            .iter()
            .copied()
            .filter(|&v| v < self.vertex_count())
            .map(|v| {
                let p = self.vertices[v].pos;
                (p.x + p.y + p.z, v)
            })
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        sorted.dedup_by_key(|entry| entry.1);

        // the coordinate sum of two points within `dist` differs by at most sqrt(3) * dist
        let window = ((3.0 as Real).sqrt() + 0.00005) * dist;
        let dist_sq = dist * dist;

        let mut doubles: HashSet<usize> = HashSet::new();
        let mut pairs = Vec::new();

        for i in 0..sorted.len() {
            let (sum_i, vi) = sorted[i];
            if doubles.contains(&vi) {
                continue;
            }
            let pi = self.vertices[vi].pos;
            for &(sum_j, vj) in &sorted[i + 1..] {
                if sum_j - sum_i > window {
                    break;
                }
                if doubles.contains(&vj) {
                    continue;
                }
                if (self.vertices[vj].pos - pi).norm_squared() <= dist_sq {
                    doubles.insert(vj);
                    pairs.push((vj, vi));
                }
            }
        }

        pairs
    }

    /// Collapse every duplicate onto its target.
    ///
    /// Faces that lose a side vanish; duplicate vertices are removed and map
    /// to their target's new index.
    pub fn weld(&mut self, targetmap: &[(usize, usize)]) -> ElementRemap {
        let mut target: Vec<usize> = (0..self.vertex_count()).collect();
        for &(dup, tgt) in targetmap {
            if dup < target.len() && tgt < target.len() && dup != tgt {
                target[dup] = tgt;
            }
        }
        // resolve chains so every vertex points at a representative of itself
        for v in 0..target.len() {
            let mut t = target[v];
            let mut hops = 0;
            while target[t] != t && hops < target.len() {
                t = target[t];
                hops += 1;
            }
            target[v] = t;
        }
        self.rebuild(&target, &HashSet::new(), &HashSet::new())
    }

    /// Weld every candidate vertex within `dist` of another candidate.
    pub fn automerge(&mut self, candidates: &[usize], dist: Real) -> ElementRemap {
        let pairs = self.find_doubles(candidates, dist);
        self.weld(&pairs)
    }

    /// Weld every vertex of the graph within `dist` of another.
    pub fn automerge_all(&mut self, dist: Real) -> ElementRemap {
        let all: Vec<usize> = (0..self.vertex_count()).collect();
        self.automerge(&all, dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn doubles_map_later_onto_earlier() {
        let mut mesh = MeshGraph::new();
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(5.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.05));

        let pairs = mesh.find_doubles(&[0, 1, 2, 3], 0.01);
        assert_eq!(pairs, vec![(2, 0)]);

        let pairs = mesh.find_doubles(&[0, 1, 2, 3], 0.05);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(3, 0)));
    }

    #[test]
    fn doubles_respect_candidate_subset() {
        let mut mesh = MeshGraph::new();
        mesh.add_vertex(Point3::origin());
        mesh.add_vertex(Point3::origin());
        mesh.add_vertex(Point3::origin());
        assert_eq!(mesh.find_doubles(&[1, 2], 0.0), vec![(2, 1)]);
        assert!(mesh.find_doubles(&[2], 1.0).is_empty());
    }

    #[test]
    fn automerge_closes_two_touching_cubes() {
        let mut mesh = MeshGraph::cube(1.0);
        let mut right = MeshGraph::cube(1.0);
        right.translate(&Vector3::new(1.0, 0.0, 0.0));
        mesh.append(&right);

        let remap = mesh.automerge_all(1e-5);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 12);
        assert!(remap.faces.iter().all(Option::is_some));
        // vertex 1 of the left cube and vertex 0 of the right cube coincide
        assert_eq!(remap.vertices[1], remap.vertices[8]);
    }

    #[test]
    fn weld_drops_collapsed_faces() {
        let mut mesh = MeshGraph::from_polygons(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            &[vec![0, 1, 2]],
        )
        .expect("valid mesh");
        let remap = mesh.weld(&[(2, 1)]);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(remap.faces, vec![None]);
        assert_eq!(mesh.vertex_count(), 2);
    }
}
