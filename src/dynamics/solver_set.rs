//! Minimal concrete `Solver`/`ConstraintSet` storage (see `dynamics::body`
//! for the rationale: this is a thin stand-in, not a constraint solver).

use rustc_hash::FxHashMap;

use crate::dynamics::BodyHandle;

/// Stable identifier for a constraint, independent of its current batch position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintHandle(pub u32);

/// Names a concrete constraint implementation (e.g. "distance joint",
/// "contact manifold"). Small enough to key a type-processor registry by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeId(pub u16);

/// Storage for every constraint of one concrete type within a batch.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeBatch {
    pub type_id: TypeId,
    pub constraint_handles: Vec<ConstraintHandle>,
}

impl TypeBatch {
    pub fn reserve_exact(&mut self, type_id: TypeId, count: usize) {
        self.type_id = type_id;
        self.constraint_handles
            .resize(count, ConstraintHandle(u32::MAX));
    }
}

/// The pre-gather representation of one constraint batch: still indexed by
/// handles rather than by position.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtoBatch {
    pub type_batches: Vec<TypeBatch>,
}

/// The body/constraint set with id [`crate::dynamics::SetId::ACTIVE`], plus
/// every inactive island's constraint set, share this layout.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    pub type_batches: Vec<TypeBatch>,
}

impl ConstraintSet {
    /// Builds an empty constraint set shaped to hold every type-batch a
    /// proto-batch describes, each sized to its handle count, without
    /// writing any handles yet.
    pub fn shaped_from(proto_batches: &[ProtoBatch]) -> Self {
        let mut type_batches = Vec::new();
        for proto in proto_batches {
            for proto_type_batch in &proto.type_batches {
                let mut batch = TypeBatch::default();
                batch.reserve_exact(proto_type_batch.type_id, proto_type_batch.constraint_handles.len());
                type_batches.push(batch);
            }
        }
        Self { type_batches }
    }
}

/// What one constraint connects, as far as the deactivator's traversal is
/// concerned: the ordered set of bodies `EnumerateConnectedBodies` visits.
#[derive(Clone, Debug, Default)]
pub struct ConstraintPayload {
    pub connected_bodies: Vec<BodyHandle>,
    pub type_id: TypeId,
}

/// Copies one range of an active type-batch's constraint handles into a
/// target type-batch. A gather job delegates to the `TypeProcessor`
/// registered for its type id, which performs one dispatch for a whole
/// range rather than one call per constraint.
pub trait TypeProcessor: Send + Sync {
    fn gather_active_constraints(
        &self,
        source_handles: &[ConstraintHandle],
        start: usize,
        end: usize,
        target: &mut TypeBatch,
    ) {
        target.constraint_handles[start..end].copy_from_slice(&source_handles[start..end]);
    }
}

/// The default processor: a straight handle-slice copy. Real constraint
/// types (contacts, joints) would additionally move per-constraint solver
/// state; that payload is outside this crate's scope.
#[derive(Default)]
pub struct DefaultTypeProcessor;

impl TypeProcessor for DefaultTypeProcessor {}

/// Owns every `ConstraintSet` (active at id 0, sleeping islands at ids 1..),
/// the constraint payload map the traversal enumerates bodies through, and
/// the registry of per-type gather processors.
#[derive(Default)]
pub struct Solver {
    pub sets: Vec<ConstraintSet>,
    payloads: FxHashMap<ConstraintHandle, ConstraintPayload>,
    type_processors: FxHashMap<TypeId, Box<dyn TypeProcessor>>,
    next_handle: u32,
}

impl Solver {
    pub fn new() -> Self {
        Self {
            sets: vec![ConstraintSet::default()],
            payloads: FxHashMap::default(),
            type_processors: FxHashMap::default(),
            next_handle: 0,
        }
    }

    /// Mints a fresh constraint handle. A stand-in for the engine's real
    /// constraint `HandlePool`, outside this crate's scope.
    pub fn mint_handle(&mut self) -> ConstraintHandle {
        let handle = ConstraintHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// The highest constraint handle id this solver has ever minted.
    pub fn highest_possibly_claimed_id(&self) -> u32 {
        self.next_handle.saturating_sub(1)
    }

    pub fn register_type_processor(&mut self, type_id: TypeId, processor: Box<dyn TypeProcessor>) {
        self.type_processors.insert(type_id, processor);
    }

    /// Registers a constraint's connectivity so `enumerate_connected_bodies` can find it.
    pub fn insert_payload(&mut self, handle: ConstraintHandle, payload: ConstraintPayload) {
        self.payloads.insert(handle, payload);
    }

    /// Invokes `visitor` once per body connected to `handle`, in the order
    /// the constraint lists them.
    pub fn enumerate_connected_bodies(&self, handle: ConstraintHandle, mut visitor: impl FnMut(BodyHandle)) {
        if let Some(payload) = self.payloads.get(&handle) {
            for &body in &payload.connected_bodies {
                visitor(body);
            }
        }
    }

    pub fn type_id_of(&self, handle: ConstraintHandle) -> Option<TypeId> {
        self.payloads.get(&handle).map(|p| p.type_id)
    }

    pub fn processor_for(&self, type_id: TypeId) -> Option<&dyn TypeProcessor> {
        self.type_processors.get(&type_id).map(|b| b.as_ref())
    }

    /// Grows `self.sets` so that `target` is a valid id, never shrinking it.
    pub fn ensure_sets_capacity(&mut self, target: usize, _current_highest: usize) {
        if target >= self.sets.len() {
            self.sets.resize_with(target + 1, ConstraintSet::default);
        }
    }
}
