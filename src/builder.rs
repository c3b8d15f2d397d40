//! Constraint graph construction.
//!
//! All islands taking part in a build (the modifier's own, then those of its
//! constraint group peers) are gathered into one combined point cloud with a
//! spatial index over their centroids. Every island is compared with every
//! other one in order of centroid distance: islands with coincident vertices
//! are adjacent and get a breakable [`Constraint`]. With auto-merge enabled the
//! anti-parallel face pairs around those vertices are recorded as seams.

use crate::constraint::{Constraint, SelectedFacePair};
use crate::float_types::{Real, compare_v3, tolerance};
use crate::island::Island;
use crate::mesh::{MarkSet, MeshGraph};
use crate::modifier::FractureSettings;
use crate::scene::ModifierId;
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use nalgebra::{Matrix4, Point3, Vector3};
use tracing::{debug, info, trace};

/// Islands of one modifier together with the transform of its object.
#[derive(Debug, Clone, Copy)]
pub struct IslandSource<'a> {
    pub islands: &'a [Island],
    pub world: &'a Matrix4<Real>,
}

/// Output of one [`ConstraintGraphBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintGraph {
    pub constraints: Vec<Constraint>,
    pub selected_pairs: Vec<SelectedFacePair>,
    /// Faces of the visible mesh belonging to a selected pair
    pub selected_faces: usize,
}

/// Every participating island gathered in world space.
///
/// Lives for a single build only.
struct CombinedNeighborhood<'a> {
    islands: Vec<&'a Island>,
    /// Per island: local vertex -> combined vertex
    index_maps: Vec<Vec<usize>>,
    /// Combined vertex -> (island slot, local vertex)
    vertex_owner: Vec<(usize, usize)>,
    centroids: Vec<Point3<Real>>,
    mesh: MeshGraph,
    tree: SpatialIndex,
}

impl<'a> CombinedNeighborhood<'a> {
    fn new(sources: &[IslandSource<'a>]) -> Self {
        let total: usize = sources.iter().map(|s| s.islands.len()).sum();
        let mut islands = Vec::with_capacity(total);
        let mut index_maps = Vec::with_capacity(total);
        let mut vertex_owner = Vec::new();
        let mut centroids = Vec::with_capacity(total);
        let mut mesh = MeshGraph::new();

        for source in sources {
            for island in source.islands {
                let slot = islands.len();
                let map: Vec<usize> = island
                    .start_coords
                    .iter()
                    .enumerate()
                    .map(|(local, co)| {
                        vertex_owner.push((slot, local));
                        mesh.add_vertex(source.world.transform_point(co))
                    })
                    .collect();
                index_maps.push(map);
                centroids.push(source.world.transform_point(&island.centroid));
                islands.push(island);
            }
        }

        let mut tree = SpatialIndexBuilder::with_capacity(islands.len());
        for (slot, centroid) in centroids.iter().enumerate() {
            tree.insert(slot, *centroid, None);
        }

        CombinedNeighborhood {
            islands,
            index_maps,
            vertex_owner,
            centroids,
            mesh,
            tree: tree.balance(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.islands.len()
    }
}

/// Coincident vertices between two islands.
#[derive(Debug, Default)]
struct SharedVertices {
    /// Pairs with one vertex on each island
    shared: usize,
    /// How many of those pairs had their duplicate on the first island
    keys_in_first: usize,
    keys_in_second: usize,
    /// Combined vertex indices on both sides of every shared pair
    seam: Vec<usize>,
}

/// Face marks on the visible mesh, scoped to one build.
#[derive(Debug, Default)]
struct SeamMarks {
    visited: MarkSet,
    selected: MarkSet,
    pairs: Vec<SelectedFacePair>,
}

pub struct ConstraintGraphBuilder<'a> {
    settings: &'a FractureSettings,
    owner: ModifierId,
    visible_mesh: &'a MeshGraph,
    allow_constraints: bool,
}

impl<'a> ConstraintGraphBuilder<'a> {
    /// `visible_mesh` is the owning modifier's source mesh, the one its islands
    /// were extracted from. `allow_constraints` gates constraint creation only;
    /// seam detection runs whenever auto-merge is on.
    pub fn new(
        settings: &'a FractureSettings,
        owner: ModifierId,
        visible_mesh: &'a MeshGraph,
        allow_constraints: bool,
    ) -> Self {
        ConstraintGraphBuilder {
            settings,
            owner,
            visible_mesh,
            allow_constraints,
        }
    }

    /// Build a fresh constraint graph over `own` followed by every peer source.
    ///
    /// Each call starts from empty, so building twice over the same islands
    /// gives the same graph.
    pub fn build(&self, own: IslandSource<'_>, peers: &[IslandSource<'_>]) -> ConstraintGraph {
        let mut sources = Vec::with_capacity(peers.len() + 1);
        sources.push(own);
        sources.extend(peers.iter().copied());

        let hood = CombinedNeighborhood::new(&sources);
        let count = hood.len();
        if count == 0 {
            debug!("no islands, nothing to connect");
            return ConstraintGraph::default();
        }

        let own_islands = own.islands;
        let face_tree = self.settings.auto_merge.then(|| self.face_tree());
        let vertex_island = self.visible_vertex_islands(own_islands);

        let mut constraints: Vec<Constraint> = Vec::new();
        let mut marks = SeamMarks::default();

        for mi in 0..count {
            let centroid = hood.centroids[mi];
            for hit in hood.tree.find_n_nearest(count, &centroid, None) {
                let mi2 = hit.index;
                if mi2 == mi {
                    continue;
                }
                let (a, b) = (hood.islands[mi], hood.islands[mi2]);
                let equal = a.owner() == b.owner();
                let (thresh, dist) = if equal {
                    (self.settings.breaking_threshold, self.settings.contact_dist)
                } else {
                    (
                        self.settings.group_breaking_threshold,
                        self.settings.group_contact_dist,
                    )
                };

                let found = Self::shared_vertices(&hood, mi, mi2, dist);

                if let Some(tree) = &face_tree {
                    for &v in &found.seam {
                        let Some(visible_v) = self.visible_vertex(&hood, v) else {
                            continue;
                        };
                        self.select_inner_faces_of_vert(
                            tree,
                            visible_v,
                            own_islands,
                            &vertex_island,
                            &mut marks,
                        );
                    }
                }

                if found.shared == 0 {
                    continue;
                }
                // same-object islands only connect when every duplicate sits on one side
                let same = !equal || found.keys_in_first == 0 || found.keys_in_second == 0;
                debug!(
                    mi = mi,
                    mi2 = mi2,
                    shared = found.shared,
                    same,
                    "islands share vertices"
                );

                let exists = constraints.iter().any(|con| con.connects(a.id, b.id));
                if !exists && same && self.allow_constraints {
                    constraints.push(Constraint::new(a.id, b.id, thresh));
                }
            }
        }

        if face_tree.is_some() {
            let unvisited = (0..self.visible_mesh.face_count())
                .filter(|&f| !marks.visited.is_face_marked(f))
                .inspect(|&f| trace!(face = f, "face not visited"))
                .count();
            debug!(unvisited, "auto-merge face visit");
        }

        let selected_faces = marks.selected.face_count();
        info!(
            islands = count,
            constraints = constraints.len(),
            selected_pairs = marks.pairs.len(),
            selected_faces,
            "built constraint graph"
        );

        ConstraintGraph {
            constraints,
            selected_pairs: marks.pairs,
            selected_faces,
        }
    }

    /// Find the coincident vertices of `mi` and `mi2` within `dist`.
    fn shared_vertices(
        hood: &CombinedNeighborhood<'_>,
        mi: usize,
        mi2: usize,
        dist: Real,
    ) -> SharedVertices {
        let mut candidates =
            Vec::with_capacity(hood.index_maps[mi].len() + hood.index_maps[mi2].len());
        candidates.extend_from_slice(&hood.index_maps[mi]);
        candidates.extend_from_slice(&hood.index_maps[mi2]);

        let mut found = SharedVertices::default();
        for (key, target) in hood.mesh.find_doubles(&candidates, dist) {
            let key_owner = hood.vertex_owner[key].0;
            let target_owner = hood.vertex_owner[target].0;
            if key_owner == target_owner {
                debug!(
                    island = key_owner,
                    key, target, "coincident vertices within one island"
                );
                continue;
            }
            found.shared += 1;
            if key_owner == mi {
                found.keys_in_first += 1;
            } else {
                found.keys_in_second += 1;
            }
            found.seam.push(key);
            found.seam.push(target);
        }
        found
    }

    /// Visible mesh vertex behind a combined vertex, for this modifier's islands only.
    fn visible_vertex(&self, hood: &CombinedNeighborhood<'_>, combined: usize) -> Option<usize> {
        let (slot, local) = hood.vertex_owner[combined];
        let island = hood.islands[slot];
        if island.owner() != self.owner {
            return None;
        }
        island
            .vertices
            .get(local)
            .copied()
            .filter(|&v| v < self.visible_mesh.vertex_count())
    }

    /// Own island slot of every visible mesh vertex.
    fn visible_vertex_islands(&self, own: &[Island]) -> Vec<Option<usize>> {
        let mut map = vec![None; self.visible_mesh.vertex_count()];
        for (slot, island) in own.iter().enumerate() {
            for &v in &island.vertices {
                if let Some(entry) = map.get_mut(v) {
                    *entry = Some(slot);
                }
            }
        }
        map
    }

    /// Face centres of the visible mesh with their normals.
    fn face_tree(&self) -> SpatialIndex {
        let mesh = self.visible_mesh;
        let mut tree = SpatialIndexBuilder::with_capacity(mesh.face_count());
        for f in 0..mesh.face_count() {
            tree.insert(f, mesh.face_center_bounds(f), Some(mesh.face(f).normal));
        }
        tree.balance()
    }

    /// Record the anti-parallel face pairs around visible vertex `vert`.
    fn select_inner_faces_of_vert(
        &self,
        tree: &SpatialIndex,
        vert: usize,
        own: &[Island],
        vertex_island: &[Option<usize>],
        marks: &mut SeamMarks,
    ) {
        let mesh = self.visible_mesh;
        let eps = tolerance();

        for &face in mesh.faces_of_vertex(vert) {
            let co = mesh.face_center_bounds(face);
            let normal = mesh.face(face).normal;

            for hit in tree.find_n_nearest(2, &co, Some(&normal)) {
                let f = hit.index;
                if marks.visited.is_face_marked(face) && marks.visited.is_face_marked(f) {
                    break;
                }
                if f == face {
                    marks.visited.mark_face(f);
                    continue;
                }
                let sum: Vector3<Real> = normal + mesh.face(f).normal;
                if !compare_v3(&sum, &Vector3::zeros(), eps) {
                    continue;
                }

                marks.selected.mark_face(f);
                marks.selected.mark_face(face);
                let island_of = |g: usize| {
                    vertex_island[mesh.face(g).verts[0]].map(|slot| own[slot].id)
                };
                if let (Some(ia), Some(ib)) = (island_of(f), island_of(face)) {
                    let pair = SelectedFacePair {
                        faces: [f, face],
                        islands: (ia, ib),
                    };
                    if !marks.pairs.iter().any(|p| p.same_faces(&pair)) {
                        marks.pairs.push(pair);
                    }
                }
                marks.visited.mark_face(f);
            }
        }
    }
}
