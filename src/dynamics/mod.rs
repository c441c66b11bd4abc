//! Body and constraint storage, and the deactivation (sleep) subsystem.

mod body;
mod solver_set;

pub mod deactivator;

pub use body::{BodyActivity, BodyHandle, BodySet, Bodies, SetId};
pub use solver_set::{
    ConstraintHandle, ConstraintSet, ProtoBatch, Solver, TypeBatch, TypeId, TypeProcessor,
};

pub use deactivator::{Deactivator, GatheringJob, Island};
