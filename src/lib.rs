//! Island decomposition and breakable constraint graphs for **rigid-body fracture**.
//!
//! A fractured mesh arrives as one polygon soup whose shards share no
//! topology. This crate splits it into [islands](island), connects touching
//! islands with breakable [constraints](constraint), and decides per
//! evaluation which seams between islands are drawn: while a constraint holds,
//! the coincident faces between its islands are hidden so the shards read as
//! one closed surface.
//!
//! The entry point for hosts is [`FractureModifier`]; the pieces it is built
//! from ([`IslandExtractor`], [`ConstraintGraphBuilder`], [`VisibilityResolver`],
//! [`SpatialIndex`]) are public for callers driving the stages themselves.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod builder;
pub mod constraint;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod island;
pub mod mesh;
pub mod modifier;
pub mod physics;
pub mod scene;
pub mod spatial;
pub mod visibility;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use builder::{ConstraintGraph, ConstraintGraphBuilder, IslandSource};
pub use constraint::{Constraint, ConstraintKind, SelectedFacePair};
pub use errors::{FractureError, FractureResult};
pub use island::{Island, IslandExtractor, IslandId};
pub use mesh::MeshGraph;
pub use modifier::{FractureModifier, FractureSettings};
pub use physics::{BookkeepingWorld, ConstraintHandle, PhysicsWorld, RapierWorld};
pub use scene::{ConstraintGroup, EvalContext, GroupId, ModifierId, ObjectId, ObjectInfo};
pub use spatial::{SpatialIndex, SpatialIndexBuilder};
pub use visibility::VisibilityResolver;
