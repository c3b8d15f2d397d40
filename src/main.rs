// main.rs
//
// Minimal walk through the fracture pipeline: a row of touching cubes is
// split into islands, glued with breakable constraints, and evaluated before
// and after the joints break.

use rbfracture::{
    BookkeepingWorld, EvalContext, FractureModifier, FractureResult, FractureSettings, MeshGraph,
    ObjectId, ObjectInfo,
};

fn main() -> FractureResult<()> {
    // Two unit cubes sharing the face x = 1
    let shards = MeshGraph::grid_of_cubes(2, 1, 1, 1.0, 0.0);
    let object = ObjectInfo::new(ObjectId(1));

    let settings = FractureSettings::default()
        .with_use_constraints(true)
        .with_auto_merge(true);
    let mut modifier = FractureModifier::new(settings);

    // 1) first evaluation: islands and constraints, no joints yet
    let out = modifier.apply(&EvalContext::standalone(&object), &shards);
    println!(
        "islands: {}, constraints: {}, seams: {}",
        modifier.islands().len(),
        modifier.constraints().len(),
        modifier.selected_pairs().len()
    );
    println!("unjoined: {} faces, {} vertices", out.face_count(), out.vertex_count());

    // 2) hand the constraints to a physics world, seams close while joints hold
    let mut world = BookkeepingWorld::new();
    let created = modifier.realize_constraints(None, &mut world)?;
    println!("joints created: {created}");

    let joined = modifier.apply(&EvalContext::standalone(&object).with_physics(&world), &shards);
    println!("joined: {} faces, {} vertices", joined.face_count(), joined.vertex_count());

    // 3) break everything, the seam faces come back
    world.disable_all();
    let broken = modifier.apply(&EvalContext::standalone(&object).with_physics(&world), &shards);
    println!("broken: {} faces, {} vertices", broken.face_count(), broken.vertex_count());

    #[cfg(feature = "stl-io")]
    {
        let _ = std::fs::create_dir_all("stl");
        std::fs::write("stl/joined.stl", joined.to_stl_ascii("joined"))?;
        std::fs::write("stl/broken.stl", broken.to_stl_ascii("broken"))?;
    }

    Ok(())
}
