//! The fracture modifier: host-facing state and entry points.
//!
//! On a refresh the modifier splits its input into islands and connects them;
//! every evaluation afterwards only re-resolves which seams are drawn.

use crate::builder::{ConstraintGraphBuilder, IslandSource};
use crate::constraint::{Constraint, SelectedFacePair};
use crate::errors::FractureResult;
use crate::float_types::Real;
use crate::island::{Island, IslandExtractor, IslandId};
use crate::mesh::MeshGraph;
use crate::physics::PhysicsWorld;
use crate::scene::{ConstraintGroup, EvalContext, GroupId, ModifierId, ModifierStacks};
use crate::visibility::VisibilityResolver;
use nalgebra::Matrix4;
use tracing::{debug, warn};

/// User-facing parameters of a [`FractureModifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct FractureSettings {
    /// Threshold of constraints between islands of the same modifier
    pub breaking_threshold: Real,
    pub use_constraints: bool,
    /// Objects whose islands are connected to this modifier's islands
    pub constraint_group: Option<GroupId>,
    /// Coincidence distance between islands of the same modifier
    pub contact_dist: Real,
    /// Threshold of constraints reaching into the constraint group
    pub group_breaking_threshold: Real,
    /// Coincidence distance into the constraint group, also the final weld distance
    pub group_contact_dist: Real,
    /// Carried for hosts that scale thresholds by island mass
    pub mass_dependent_thresholds: bool,
    /// Hide seams between connected islands
    pub auto_merge: bool,
}

impl Default for FractureSettings {
    fn default() -> Self {
        FractureSettings {
            breaking_threshold: 10.0,
            use_constraints: false,
            constraint_group: None,
            contact_dist: 0.00001,
            group_breaking_threshold: 1.0,
            group_contact_dist: 0.0001,
            mass_dependent_thresholds: false,
            auto_merge: false,
        }
    }
}

impl FractureSettings {
    pub fn with_breaking_threshold(mut self, value: Real) -> Self {
        self.breaking_threshold = value;
        self
    }

    pub fn with_use_constraints(mut self, value: bool) -> Self {
        self.use_constraints = value;
        self
    }

    pub fn with_constraint_group(mut self, group: Option<GroupId>) -> Self {
        self.constraint_group = group;
        self
    }

    pub fn with_contact_dist(mut self, value: Real) -> Self {
        self.contact_dist = value;
        self
    }

    pub fn with_group_breaking_threshold(mut self, value: Real) -> Self {
        self.group_breaking_threshold = value;
        self
    }

    pub fn with_group_contact_dist(mut self, value: Real) -> Self {
        self.group_contact_dist = value;
        self
    }

    pub fn with_mass_dependent_thresholds(mut self, value: bool) -> Self {
        self.mass_dependent_thresholds = value;
        self
    }

    pub fn with_auto_merge(mut self, value: bool) -> Self {
        self.auto_merge = value;
        self
    }
}

#[derive(Debug)]
pub struct FractureModifier {
    id: ModifierId,
    pub settings: FractureSettings,
    /// Set by the host whenever a parameter affecting islands changes
    pub refresh: bool,
    origmat: Matrix4<Real>,
    visible_mesh: Option<MeshGraph>,
    islands: Vec<Island>,
    constraints: Vec<Constraint>,
    selected_pairs: Vec<SelectedFacePair>,
}

impl Default for FractureModifier {
    fn default() -> Self {
        Self::new(FractureSettings::default())
    }
}

impl FractureModifier {
    pub fn new(settings: FractureSettings) -> Self {
        FractureModifier {
            id: ModifierId::next(),
            settings,
            refresh: true,
            origmat: Matrix4::zeros(),
            visible_mesh: None,
            islands: Vec::new(),
            constraints: Vec::new(),
            selected_pairs: Vec::new(),
        }
    }

    /// A fresh modifier with the same settings; islands are rebuilt on first use.
    pub fn duplicate(&self) -> Self {
        Self::new(self.settings.clone())
    }

    #[inline]
    pub fn id(&self) -> ModifierId {
        self.id
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn selected_pairs(&self) -> &[SelectedFacePair] {
        &self.selected_pairs
    }

    pub fn visible_mesh(&self) -> Option<&MeshGraph> {
        self.visible_mesh.as_ref()
    }

    /// Object matrix captured at the last refresh.
    pub fn object_matrix(&self) -> &Matrix4<Real> {
        &self.origmat
    }

    /// Release islands, constraints, seams and the visible mesh.
    pub fn free(&mut self) {
        self.islands.clear();
        self.constraints.clear();
        self.selected_pairs.clear();
        self.visible_mesh = None;
    }

    /// Seam visibility follows the simulation, so every frame re-evaluates.
    pub fn depends_on_time(&self) -> bool {
        true
    }

    /// Visit the object references held by this modifier: the constraint group.
    pub fn for_each_referenced_object(&mut self, mut visit: impl FnMut(&mut Option<GroupId>)) {
        visit(&mut self.settings.constraint_group);
    }

    /// Evaluate the modifier on `mesh`.
    ///
    /// Without a refresh and without prior state the input is returned as is.
    pub fn apply(&mut self, ctx: &EvalContext<'_>, mesh: &MeshGraph) -> MeshGraph {
        if self.refresh {
            self.rebuild(ctx, mesh);
            self.refresh = false;
        }

        match &self.visible_mesh {
            Some(visible) if self.settings.auto_merge => VisibilityResolver::new(
                &self.settings,
                visible,
                &self.selected_pairs,
                &self.constraints,
                ctx.physics,
            )
            .resolve(),
            Some(visible) => visible.clone(),
            None => mesh.clone(),
        }
    }

    fn rebuild(&mut self, ctx: &EvalContext<'_>, mesh: &MeshGraph) {
        self.free();
        self.origmat = ctx.object.world;

        let visible = mesh.clone();
        self.islands = IslandExtractor::new(self.id, &self.origmat).extract(&visible);
        self.visible_mesh = Some(visible);

        let group = self.resolve_group(ctx);
        let in_group = group.is_some_and(|g| g.contains(ctx.object.id));
        let wanted = self.settings.use_constraints || self.settings.auto_merge;
        if wanted && (!in_group || self.settings.auto_merge) {
            self.create_constraints(ctx, group, in_group);
        }
    }

    fn resolve_group<'c>(&self, ctx: &EvalContext<'c>) -> Option<&'c ConstraintGroup> {
        let id = self.settings.constraint_group?;
        let group = ctx.group(id);
        if group.is_none() {
            debug!(group = id.0, "constraint group not found, ignoring");
        }
        group
    }

    fn create_constraints(
        &mut self,
        ctx: &EvalContext<'_>,
        group: Option<&ConstraintGroup>,
        in_group: bool,
    ) {
        let peers: Vec<IslandSource<'_>> = group
            .map(|g| ctx.group_modifiers(g))
            .unwrap_or_default()
            .into_iter()
            .filter(|peer| peer.id != self.id)
            .map(|peer| IslandSource {
                islands: &peer.islands,
                world: &peer.origmat,
            })
            .collect();

        let Some(visible) = self.visible_mesh.as_ref() else {
            return;
        };
        let allow = self.settings.use_constraints && !in_group;
        let graph = ConstraintGraphBuilder::new(&self.settings, self.id, visible, allow).build(
            IslandSource {
                islands: &self.islands,
                world: &self.origmat,
            },
            &peers,
        );

        self.constraints = graph.constraints;
        self.selected_pairs = graph.selected_pairs;
    }

    /// Create physics joints for every constraint that has none yet.
    ///
    /// Islands of group peers are looked up in `stacks`. Returns how many
    /// joints were created.
    ///
    /// ## Errors
    /// If `world` fails to create a joint; constraints realized before the
    /// failure keep their handles.
    pub fn realize_constraints(
        &mut self,
        stacks: Option<&ModifierStacks>,
        world: &mut dyn PhysicsWorld,
    ) -> FractureResult<usize> {
        let mut created = 0;
        for i in 0..self.constraints.len() {
            let con = &self.constraints[i];
            if con.physics_constraint.is_some() {
                continue;
            }
            let (Some(a), Some(b)) = (
                find_island(self.id, &self.islands, stacks, con.mi1),
                find_island(self.id, &self.islands, stacks, con.mi2),
            ) else {
                warn!(mi1 = ?con.mi1, mi2 = ?con.mi2, "constraint refers to a missing island");
                continue;
            };
            let handle = world.create_breakable_constraint(con.kind, a, b, con.breaking_threshold)?;
            self.constraints[i].physics_constraint = Some(handle);
            created += 1;
        }
        debug!(created, "realized constraints");
        Ok(created)
    }
}

fn find_island<'s>(
    own_id: ModifierId,
    own: &'s [Island],
    stacks: Option<&'s ModifierStacks>,
    id: IslandId,
) -> Option<&'s Island> {
    if id.modifier == own_id {
        return own.get(id.index);
    }
    stacks?
        .values()
        .flat_map(|stack| stack.iter())
        .find(|modifier| modifier.id == id.modifier)
        .and_then(|modifier| modifier.islands.get(id.index))
}
