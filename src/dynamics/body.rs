//! Minimal concrete `Bodies`/`BodySet` storage. This is deliberately thin:
//! it exists so the deactivator can be built and tested standalone, not as
//! a full rigid body engine.

use rustc_hash::FxHashMap;

use crate::dynamics::ConstraintHandle;
use crate::math::{Isometry, Vector};

/// Stable identifier for a body, independent of its current array position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyHandle(pub u32);

/// Names a `BodySet`/`ConstraintSet` slot. `0` is the active set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SetId(pub u32);

impl SetId {
    /// The reserved id naming the set of bodies currently simulated.
    pub const ACTIVE: SetId = SetId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-body sleep bookkeeping. Only `deactivation_candidate` is read by the
/// deactivator; the other field is carried because a real engine's
/// `Activity` record holds more than one flag and gather must preserve it
/// byte-for-byte.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyActivity {
    /// Whether this body is eligible to be part of a sleeping island this tick.
    pub deactivation_candidate: bool,
    /// Accumulated low-motion time, carried verbatim across a gather (not
    /// consulted by the deactivator itself — that's the reactivator's job).
    pub time_below_threshold: f32,
}

impl BodyActivity {
    /// A body that is immediately eligible for deactivation consideration.
    pub fn candidate() -> Self {
        Self {
            deactivation_candidate: true,
            time_below_threshold: 0.0,
        }
    }

    /// A body that must never be folded into a sleeping island.
    pub fn not_candidate() -> Self {
        Self {
            deactivation_candidate: false,
            time_below_threshold: 0.0,
        }
    }
}

/// Opaque per-body velocity pair, copied verbatim by gather.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    pub linear: Vector,
    pub angular: Vector,
}

/// Opaque per-body inverse-inertia stand-in, copied verbatim by gather.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalInertia {
    pub inverse_mass: f32,
}

/// Opaque collision-shape handle, copied verbatim by gather.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Collidable(pub u32);

/// The body/constraint set with id [`SetId::ACTIVE`], plus every inactive
/// (sleeping) island's set, share this layout.
#[derive(Clone, Debug, Default)]
pub struct BodySet {
    pub index_to_handle: Vec<BodyHandle>,
    pub activity: Vec<BodyActivity>,
    pub collidables: Vec<Collidable>,
    /// Per-body ordered list of `(constraint handle, index-in-constraint)`.
    pub constraints: Vec<Vec<(ConstraintHandle, u32)>>,
    pub local_inertias: Vec<LocalInertia>,
    pub poses: Vec<Isometry>,
    pub velocities: Vec<Velocity>,
}

impl BodySet {
    /// Number of bodies currently stored in this set.
    pub fn len(&self) -> usize {
        self.index_to_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_handle.is_empty()
    }

    /// Reserves room for exactly `count` bodies, without writing anything.
    /// Used before a gather target is populated.
    pub fn reserve_exact(&mut self, count: usize) {
        self.index_to_handle.resize(count, BodyHandle(u32::MAX));
        self.activity.resize(count, BodyActivity::not_candidate());
        self.collidables.resize(count, Collidable::default());
        self.constraints.resize_with(count, Vec::new);
        self.local_inertias.resize(count, LocalInertia::default());
        self.poses.resize(count, Isometry::identity());
        self.velocities.resize(count, Velocity::default());
    }

    /// Appends one body's data, returning its new index in this set.
    pub fn push(
        &mut self,
        handle: BodyHandle,
        activity: BodyActivity,
        collidable: Collidable,
        constraints: Vec<(ConstraintHandle, u32)>,
        local_inertia: LocalInertia,
        pose: Isometry,
        velocity: Velocity,
    ) -> usize {
        let index = self.len();
        self.index_to_handle.push(handle);
        self.activity.push(activity);
        self.collidables.push(collidable);
        self.constraints.push(constraints);
        self.local_inertias.push(local_inertia);
        self.poses.push(pose);
        self.velocities.push(velocity);
        index
    }

    /// Copies body `source` of `self` into `target[target_index]`, preserving
    /// every field exactly.
    pub fn copy_into(&self, source: usize, target: &mut BodySet, target_index: usize) {
        target.index_to_handle[target_index] = self.index_to_handle[source];
        target.activity[target_index] = self.activity[source];
        target.collidables[target_index] = self.collidables[source];
        target.constraints[target_index] = self.constraints[source].clone();
        target.local_inertias[target_index] = self.local_inertias[source];
        target.poses[target_index] = self.poses[source];
        target.velocities[target_index] = self.velocities[source];
    }
}

/// Owns every `BodySet` (active at id 0, sleeping islands at ids 1..) and
/// the handle→location index the deactivator needs to resolve handles back
/// to positions after a gather.
#[derive(Default)]
pub struct Bodies {
    pub sets: Vec<BodySet>,
    handle_to_location: FxHashMap<BodyHandle, (SetId, usize)>,
    next_handle: u32,
}

impl Bodies {
    /// Creates an engine with only the (empty) active set.
    pub fn new() -> Self {
        Self {
            sets: vec![BodySet::default()],
            handle_to_location: FxHashMap::default(),
            next_handle: 0,
        }
    }

    /// Mints a fresh body handle. A stand-in for the engine's real
    /// `HandlePool`, which lives outside this crate's scope.
    pub fn mint_handle(&mut self) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub fn active_set(&self) -> &BodySet {
        &self.sets[SetId::ACTIVE.index()]
    }

    pub fn active_set_mut(&mut self) -> &mut BodySet {
        &mut self.sets[SetId::ACTIVE.index()]
    }

    /// Adds a body to the active set, recording its handle→location entry.
    #[allow(clippy::too_many_arguments)]
    pub fn add_active(
        &mut self,
        handle: BodyHandle,
        activity: BodyActivity,
        collidable: Collidable,
        constraints: Vec<(ConstraintHandle, u32)>,
        local_inertia: LocalInertia,
        pose: Isometry,
        velocity: Velocity,
    ) -> usize {
        let index = self.active_set_mut().push(
            handle,
            activity,
            collidable,
            constraints,
            local_inertia,
            pose,
            velocity,
        );
        self.handle_to_location.insert(handle, (SetId::ACTIVE, index));
        index
    }

    pub fn handle_to_location(&self, handle: BodyHandle) -> Option<(SetId, usize)> {
        self.handle_to_location.get(&handle).copied()
    }

    pub(crate) fn set_location(&mut self, handle: BodyHandle, location: (SetId, usize)) {
        self.handle_to_location.insert(handle, location);
    }

    /// Grows `self.sets` so that `target` is a valid id, never shrinking it.
    ///
    /// `_current_highest` is accepted for signature parity with the
    /// collaborator contract other subsystems call through, even though
    /// this implementation derives the same information from
    /// `self.sets.len()`.
    pub fn ensure_sets_capacity(&mut self, target: usize, _current_highest: usize) {
        if target >= self.sets.len() {
            self.sets.resize_with(target + 1, BodySet::default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_handle_is_monotonic_and_unique() {
        let mut bodies = Bodies::new();
        let a = bodies.mint_handle();
        let b = bodies.mint_handle();
        assert_ne!(a, b);
    }

    #[test]
    fn add_active_updates_handle_to_location() {
        let mut bodies = Bodies::new();
        let h = bodies.mint_handle();
        let idx = bodies.add_active(
            h,
            BodyActivity::candidate(),
            Collidable::default(),
            Vec::new(),
            LocalInertia::default(),
            Isometry::identity(),
            Velocity::default(),
        );
        assert_eq!(bodies.handle_to_location(h), Some((SetId::ACTIVE, idx)));
    }

    #[test]
    fn ensure_sets_capacity_grows_without_truncating() {
        let mut bodies = Bodies::new();
        bodies.ensure_sets_capacity(3, 0);
        assert_eq!(bodies.sets.len(), 4);
        bodies.ensure_sets_capacity(1, 3);
        assert_eq!(bodies.sets.len(), 4, "must never shrink");
    }

    #[test]
    fn copy_into_preserves_every_field() {
        let mut bodies = Bodies::new();
        let h = bodies.mint_handle();
        bodies.add_active(
            h,
            BodyActivity::candidate(),
            Collidable(7),
            vec![(ConstraintHandle(2), 0)],
            LocalInertia { inverse_mass: 0.5 },
            Isometry::translation(1.0, 2.0, 3.0),
            Velocity {
                linear: Vector::new(1.0, 0.0, 0.0),
                angular: Vector::zeros(),
            },
        );

        let mut target = BodySet::default();
        target.reserve_exact(1);
        bodies.active_set().copy_into(0, &mut target, 0);

        assert_eq!(target.index_to_handle[0], h);
        assert_eq!(target.collidables[0], Collidable(7));
        assert_eq!(target.constraints[0], vec![(ConstraintHandle(2), 0)]);
        assert_eq!(target.local_inertias[0].inverse_mass, 0.5);
        assert_eq!(target.poses[0], Isometry::translation(1.0, 2.0, 3.0));
        assert_eq!(target.velocities[0].linear, Vector::new(1.0, 0.0, 0.0));
    }
}
