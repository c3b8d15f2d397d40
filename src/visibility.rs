//! Which seams are drawn.
//!
//! Works on a disposable copy of the visible mesh. Faces of a seam whose
//! constraint still holds are hidden (deleted from the output) so the joined
//! islands read as one closed surface; once the constraint breaks the seam
//! faces are drawn again.

use crate::constraint::{Constraint, SelectedFacePair, find_constraint};
use crate::float_types::{AUTOMERGE_DIST, compare_v3};
use crate::mesh::edit::ElementRemap;
use crate::mesh::{MarkSet, MeshGraph};
use crate::modifier::FractureSettings;
use crate::physics::PhysicsWorld;
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use hashbrown::HashSet;
use tracing::debug;

/// A disposable copy of the visible mesh with its per-pass face marks.
#[derive(Debug, Clone)]
pub struct MergeCopy {
    pub mesh: MeshGraph,
    /// Faces taking part in a seam
    pub tagged: MarkSet,
    /// Faces to delete from the output
    pub selected: MarkSet,
    /// Visible mesh face -> face of `mesh`
    faces: Vec<Option<usize>>,
}

impl MergeCopy {
    pub fn new(visible: &MeshGraph) -> Self {
        MergeCopy {
            mesh: visible.clone(),
            tagged: MarkSet::new(),
            selected: MarkSet::new(),
            faces: (0..visible.face_count()).map(Some).collect(),
        }
    }

    /// The copy's face for a visible mesh face, if it survived.
    #[inline]
    pub fn face_of(&self, visible_face: usize) -> Option<usize> {
        self.faces.get(visible_face).copied().flatten()
    }

    fn apply_remap(&mut self, remap: &ElementRemap) {
        for face in &mut self.faces {
            *face = face.and_then(|f| remap.faces.get(f).copied().flatten());
        }
        self.tagged.remap_faces(&remap.faces);
        self.selected.remap_faces(&remap.faces);
    }
}

pub struct VisibilityResolver<'a> {
    settings: &'a FractureSettings,
    visible_mesh: &'a MeshGraph,
    pairs: &'a [SelectedFacePair],
    constraints: &'a [Constraint],
    physics: Option<&'a dyn PhysicsWorld>,
}

impl<'a> VisibilityResolver<'a> {
    pub fn new(
        settings: &'a FractureSettings,
        visible_mesh: &'a MeshGraph,
        pairs: &'a [SelectedFacePair],
        constraints: &'a [Constraint],
        physics: Option<&'a dyn PhysicsWorld>,
    ) -> Self {
        VisibilityResolver {
            settings,
            visible_mesh,
            pairs,
            constraints,
            physics,
        }
    }

    /// Whether the constraint behind `pair` exists, is realized and holds.
    fn pair_holds(&self, pair: &SelectedFacePair) -> bool {
        let Some(world) = self.physics else {
            return false;
        };
        find_constraint(self.constraints, pair.islands.0, pair.islands.1)
            .is_some_and(|con| con.is_enabled(world))
    }

    /// Tag every seam face and select (hide) it iff its constraint holds.
    pub fn check_face_draw_by_constraint(&self, copy: &mut MergeCopy) {
        for pair in self.pairs {
            let holds = self.pair_holds(pair);
            let faces: Vec<usize> = pair.faces.iter().filter_map(|&f| copy.face_of(f)).collect();
            for f in faces {
                copy.tagged.mark_face(f);
                if holds {
                    copy.selected.mark_face(f);
                } else {
                    copy.selected.unmark_face(f);
                }
            }
        }
    }

    /// Weld the copy, then hide the nearest surviving seam face for every
    /// seam face that vanished or moved in the weld.
    pub fn check_face_draw_by_proximity(&self, copy: &mut MergeCopy) {
        let remap = copy.mesh.automerge_all(AUTOMERGE_DIST);
        copy.apply_remap(&remap);

        let mut builder = SpatialIndexBuilder::with_capacity(copy.tagged.face_count());
        for f in copy.tagged.sorted_faces() {
            builder.insert(f, copy.mesh.face_center_bounds(f), None);
        }
        let tree = builder.balance();

        for pair in self.pairs {
            for &visible_face in &pair.faces {
                if let Some(f) = self.closest_available_face(&tree, copy, visible_face) {
                    copy.selected.mark_face(f);
                }
            }
        }
    }

    /// `None` when the visible face is still in place on the copy, else the
    /// nearest tagged face of the copy.
    fn closest_available_face(
        &self,
        tree: &SpatialIndex,
        copy: &MergeCopy,
        visible_face: usize,
    ) -> Option<usize> {
        if visible_face >= self.visible_mesh.face_count() {
            return None;
        }
        let co2 = self.visible_mesh.face_center_bounds(visible_face);
        if let Some(f) = copy.face_of(visible_face) {
            let co = copy.mesh.face_center_bounds(f);
            if compare_v3(&co.coords, &co2.coords, self.settings.group_contact_dist) {
                return None;
            }
        }
        tree.find_nearest(&co2).map(|hit| hit.index)
    }

    /// The output mesh: the visible mesh with hidden seam faces deleted and
    /// the boundary they leave welded shut.
    pub fn resolve(&self) -> MeshGraph {
        let mut copy = MergeCopy::new(self.visible_mesh);
        self.check_face_draw_by_constraint(&mut copy);
        if self.settings.group_contact_dist > 0.0 {
            self.check_face_draw_by_proximity(&mut copy);
        }

        let boundary: HashSet<usize> = copy
            .selected
            .sorted_faces()
            .into_iter()
            .flat_map(|f| copy.mesh.face(f).verts.clone())
            .collect();
        let hidden = copy.selected.face_count();

        let remap = copy.mesh.delete_faces(&copy.selected);
        let mut candidates: Vec<usize> = boundary
            .into_iter()
            .filter_map(|v| remap.vertices[v])
            .collect();
        candidates.sort_unstable();
        copy.mesh
            .automerge(&candidates, self.settings.group_contact_dist);

        debug!(
            pairs = self.pairs.len(),
            hidden,
            faces = copy.mesh.face_count(),
            "resolved seam visibility"
        );
        copy.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ConstraintGraphBuilder, IslandSource};
    use crate::island::{Island, IslandExtractor};
    use crate::physics::BookkeepingWorld;
    use crate::scene::ModifierId;
    use nalgebra::Matrix4;

    struct Seam {
        mesh: MeshGraph,
        islands: Vec<Island>,
        settings: FractureSettings,
        constraints: Vec<Constraint>,
        pairs: Vec<SelectedFacePair>,
    }

    fn seam() -> Seam {
        let settings = FractureSettings::default()
            .with_use_constraints(true)
            .with_auto_merge(true);
        let mesh = MeshGraph::grid_of_cubes(2, 1, 1, 1.0, 0.0);
        let owner = ModifierId::next();
        let islands = IslandExtractor::new(owner, &Matrix4::identity()).extract(&mesh);
        let world = Matrix4::identity();
        let graph = ConstraintGraphBuilder::new(&settings, owner, &mesh, true).build(
            IslandSource { islands: &islands, world: &world },
            &[],
        );
        Seam {
            mesh,
            islands,
            settings,
            constraints: graph.constraints,
            pairs: graph.selected_pairs,
        }
    }

    #[test]
    fn unrealized_constraints_leave_seams_drawn() {
        let seam = seam();
        let resolver =
            VisibilityResolver::new(&seam.settings, &seam.mesh, &seam.pairs, &seam.constraints, None);
        let mut copy = MergeCopy::new(&seam.mesh);
        resolver.check_face_draw_by_constraint(&mut copy);
        assert_eq!(copy.tagged.face_count(), 2);
        assert_eq!(copy.selected.face_count(), 0);

        let out = resolver.resolve();
        assert_eq!(out.face_count(), 12);
        assert_eq!(out.vertex_count(), 12, "touching corners are welded");
    }

    #[test]
    fn holding_constraint_hides_the_seam() {
        let mut seam = seam();
        let mut world = BookkeepingWorld::new();
        for con in &mut seam.constraints {
            let a = &seam.islands[con.mi1.index];
            let b = &seam.islands[con.mi2.index];
            con.physics_constraint = Some(
                world
                    .create_breakable_constraint(con.kind, a, b, con.breaking_threshold)
                    .expect("bookkeeping never fails"),
            );
        }

        let resolver = VisibilityResolver::new(
            &seam.settings,
            &seam.mesh,
            &seam.pairs,
            &seam.constraints,
            Some(&world),
        );
        let out = resolver.resolve();
        assert_eq!(out.face_count(), 10);
        assert_eq!(out.vertex_count(), 12);

        world.disable_all();
        let resolver = VisibilityResolver::new(
            &seam.settings,
            &seam.mesh,
            &seam.pairs,
            &seam.constraints,
            Some(&world),
        );
        assert_eq!(resolver.resolve().face_count(), 12);
    }

    #[test]
    fn copy_tracks_faces_through_welds() {
        let seam = seam();
        let mut copy = MergeCopy::new(&seam.mesh);
        copy.tagged.mark_face(5);
        let remap = copy.mesh.automerge_all(AUTOMERGE_DIST);
        copy.apply_remap(&remap);
        assert_eq!(copy.face_of(5), Some(5));
        assert_eq!(copy.tagged.sorted_faces(), vec![5]);
    }

    #[test]
    fn holding_constraint_selects_both_seam_faces() {
        let mut seam = seam();
        let mut world = BookkeepingWorld::new();
        let con = &mut seam.constraints[0];
        con.physics_constraint = Some(
            world
                .create_breakable_constraint(
                    con.kind,
                    &seam.islands[con.mi1.index],
                    &seam.islands[con.mi2.index],
                    con.breaking_threshold,
                )
                .expect("bookkeeping never fails"),
        );

        let resolver = VisibilityResolver::new(
            &seam.settings,
            &seam.mesh,
            &seam.pairs,
            &seam.constraints,
            Some(&world),
        );
        let mut copy = MergeCopy::new(&seam.mesh);
        resolver.check_face_draw_by_constraint(&mut copy);
        assert_eq!(copy.tagged.sorted_faces(), vec![5, 10]);
        assert_eq!(copy.selected.sorted_faces(), vec![5, 10]);
    }
}
