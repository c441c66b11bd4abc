//! Island deactivation and convex hull construction for a 3-dimensional
//! real-time physics engine.
//!
//! This crate covers two independent subsystems that share the same
//! low-level data structures (a dense bit-set, an id pool, a thread
//! dispatcher):
//!
//! - [`dynamics::deactivator`]: puts islands of mutually-touching bodies to
//!   sleep once they have been at rest for long enough, scanning only a
//!   bounded fraction of the active set per frame.
//! - [`geometry::convex_hull`]: builds the convex hull of an arbitrary
//!   point cloud via vectorized gift-wrapping.

#![allow(clippy::too_many_arguments)]

extern crate nalgebra as na;

mod data;
mod dynamics;
mod geometry;
mod math;
mod utils;

pub use data::{BufferPool, IdPool, IndexSet, ThreadDispatcher};
pub use dynamics::{
    BodyActivity, BodyHandle, Bodies, BodySet, ConstraintHandle, ConstraintSet, Deactivator,
    GatheringJob, Island, ProtoBatch, Solver, TypeBatch, TypeId, TypeProcessor, SetId,
};
pub use geometry::convex_hull::{compute_hull, process_hull, ConvexHull, FacePlane, HullData, PointBundle};
pub use math::{Isometry, Point, Real, Rotation, Vector, SIMD_WIDTH};
