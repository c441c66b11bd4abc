//! Depth-first island collection.

use crate::data::{BufferPool, IndexSet};
use crate::dynamics::body::BodyActivity;
use crate::dynamics::{Bodies, BodyHandle, ConstraintHandle, ProtoBatch, SetId, Solver, TypeBatch, TypeId};
use rustc_hash::FxHashMap;

/// One connected component discovered by a traversal that succeeded.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Island {
    /// Active-set body indices in DFS order. `body_indices[0]` is this
    /// island's identity for deduplication.
    pub body_indices: Vec<usize>,
    /// Proto-batches built from the constraint handles this traversal visited.
    pub proto_batches: Vec<ProtoBatch>,
}

/// Per-worker traversal bookkeeping, kept for the lifetime of one `Update` call.
#[derive(Default)]
pub struct WorkerTraversalResults {
    /// Union of every body visited by this worker, across every traversal
    /// it attempted — whether or not that traversal ultimately succeeded.
    pub traversed_bodies: IndexSet,
    pub islands: Vec<Island>,
}

/// Decides whether a traversal may step onto `body_index`, and records the
/// visit as a side effect. [`CandidateFilteringPredicate`] is what normal
/// ticks use; [`UnconditionalPredicate`] visits every body regardless of
/// candidacy and is kept for a forced-deactivation pass this crate does
/// not otherwise expose.
pub(crate) trait DeactivationPredicate {
    /// Returns `true` if the body may be folded into the island being built.
    ///
    /// Marking into `traversed_bodies` happens *before* the eligibility
    /// check, so a rejected body still prevents other seeds on this worker
    /// from retrying the same component.
    fn visit(&self, traversed_bodies: &mut IndexSet, body_index: usize, activity: &BodyActivity) -> bool;
}

pub(crate) struct CandidateFilteringPredicate;

impl DeactivationPredicate for CandidateFilteringPredicate {
    fn visit(&self, traversed_bodies: &mut IndexSet, body_index: usize, activity: &BodyActivity) -> bool {
        if !traversed_bodies.insert(body_index) {
            return false;
        }
        activity.deactivation_candidate
    }
}

#[allow(dead_code)]
pub(crate) struct UnconditionalPredicate;

impl DeactivationPredicate for UnconditionalPredicate {
    fn visit(&self, traversed_bodies: &mut IndexSet, body_index: usize, _activity: &BodyActivity) -> bool {
        traversed_bodies.insert(body_index)
    }
}

/// Attempts one depth-first traversal from `seed`. Returns `Some(Island)` on
/// success, `None` if the predicate rejected some body along the way.
///
/// Every scratch structure this traversal needs — the visited-body and
/// visited-constraint sets, the DFS stack, the island's own body list and
/// proto-batch map — comes from `pool` and (where its lifetime ends inside
/// this call) is returned to `pool` before returning. `body_indices` and the
/// built `proto_batches` outlive this call as part of the returned `Island`,
/// so they are taken from the pool but never given back here.
pub(crate) fn collect_island(
    seed: usize,
    bodies: &Bodies,
    solver: &Solver,
    predicate: &dyn DeactivationPredicate,
    traversed_bodies: &mut IndexSet,
    pool: &mut BufferPool,
    initial_body_capacity: usize,
    initial_constraint_capacity: usize,
) -> Option<Island> {
    let active_bodies = bodies.active_set();

    if !predicate.visit(traversed_bodies, seed, &active_bodies.activity[seed]) {
        return None;
    }

    let mut considered_bodies: IndexSet = pool.take();
    considered_bodies.clear();
    let mut considered_constraints: IndexSet = pool.take();
    considered_constraints.clear();
    let mut visitation_stack: Vec<usize> = pool.take_vec(initial_body_capacity);
    let mut body_indices: Vec<usize> = pool.take_vec(initial_body_capacity);
    let mut newly_pushed: Vec<usize> = pool.take_vec(8);
    // Keyed by type id so constraints discovered out of order still land in
    // a stable, per-type ordered handle list.
    let mut proto_batch: FxHashMap<TypeId, Vec<ConstraintHandle>> = pool.take();
    proto_batch.clear();

    visitation_stack.push(seed);
    considered_bodies.insert_unsafely(seed);
    body_indices.push(seed);

    while let Some(b) = visitation_stack.pop() {
        for &(constraint_handle, _index_in_constraint) in &active_bodies.constraints[b] {
            if !considered_constraints.insert(constraint_handle.0 as usize) {
                continue;
            }

            let type_id = solver.type_id_of(constraint_handle).unwrap_or(TypeId(0));

            let mut aborted = false;
            newly_pushed.clear();
            solver.enumerate_connected_bodies(constraint_handle, |other_handle: BodyHandle| {
                if aborted {
                    return;
                }
                if let Some((set_id, other_index)) = bodies.handle_to_location(other_handle) {
                    debug_assert_eq!(set_id, SetId::ACTIVE, "traversal only walks the active set");
                    if other_index == b {
                        return;
                    }
                    if !predicate.visit(traversed_bodies, other_index, &active_bodies.activity[other_index]) {
                        aborted = true;
                        return;
                    }
                    if considered_bodies.insert(other_index) {
                        newly_pushed.push(other_index);
                    }
                }
            });

            if aborted {
                pool.return_val(considered_bodies);
                pool.return_val(considered_constraints);
                pool.return_vec(visitation_stack);
                pool.return_vec(newly_pushed);
                proto_batch.clear();
                pool.return_val(proto_batch);
                return None;
            }

            proto_batch.entry(type_id).or_insert_with(|| Vec::with_capacity(initial_constraint_capacity)).push(constraint_handle);
            for &idx in &newly_pushed {
                visitation_stack.push(idx);
                body_indices.push(idx);
            }
        }
    }

    pool.return_val(considered_bodies);
    pool.return_val(considered_constraints);
    pool.return_vec(visitation_stack);
    pool.return_vec(newly_pushed);

    let mut type_batches: Vec<TypeBatch> = proto_batch
        .drain()
        .map(|(type_id, constraint_handles)| TypeBatch {
            type_id,
            constraint_handles,
        })
        .collect();
    type_batches.sort_by_key(|b| b.type_id);
    pool.return_val(proto_batch);

    Some(Island {
        body_indices,
        proto_batches: vec![ProtoBatch { type_batches }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::body::{BodyActivity, Collidable, LocalInertia, Velocity};
    use crate::dynamics::solver_set::ConstraintPayload;
    use crate::math::Isometry;

    fn square_fixture() -> (Bodies, Solver, Vec<BodyHandle>, Vec<ConstraintHandle>) {
        let mut bodies = Bodies::new();
        let mut solver = Solver::new();
        let handles: Vec<_> = (0..4).map(|_| bodies.mint_handle()).collect();
        for &h in &handles {
            bodies.add_active(
                h,
                BodyActivity::candidate(),
                Collidable::default(),
                Vec::new(),
                LocalInertia::default(),
                Isometry::identity(),
                Velocity::default(),
            );
        }
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0)];
        let mut constraint_handles = Vec::new();
        for &(a, b) in &edges {
            let ch = solver.mint_handle();
            solver.insert_payload(
                ch,
                ConstraintPayload {
                    connected_bodies: vec![handles[a], handles[b]],
                    type_id: TypeId(0),
                },
            );
            constraint_handles.push(ch);
            bodies.active_set_mut().constraints[a].push((ch, 0));
            bodies.active_set_mut().constraints[b].push((ch, 1));
        }
        (bodies, solver, handles, constraint_handles)
    }

    #[test]
    fn e1_single_island_from_a_square() {
        let (bodies, solver, _handles, constraint_handles) = square_fixture();
        let mut traversed = IndexSet::new();
        let mut pool = BufferPool::new();
        let island = collect_island(0, &bodies, &solver, &CandidateFilteringPredicate, &mut traversed, &mut pool, 1024, 1024).unwrap();

        let mut visited = island.body_indices.clone();
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2, 3]);

        let all_handles: Vec<ConstraintHandle> = island
            .proto_batches
            .iter()
            .flat_map(|p| p.type_batches.iter())
            .flat_map(|b| b.constraint_handles.iter().copied())
            .collect();
        let mut all_handles_sorted = all_handles.clone();
        all_handles_sorted.sort_by_key(|h| h.0);
        let mut expected_sorted = constraint_handles.clone();
        expected_sorted.sort_by_key(|h| h.0);
        assert_eq!(all_handles_sorted, expected_sorted);
    }

    #[test]
    fn e2_mixed_candidacy_aborts_traversal() {
        let mut bodies = Bodies::new();
        let mut solver = Solver::new();
        let handles: Vec<_> = (0..5).map(|_| bodies.mint_handle()).collect();
        for (i, &h) in handles.iter().enumerate() {
            let activity = if i == 2 {
                BodyActivity::not_candidate()
            } else {
                BodyActivity::candidate()
            };
            bodies.add_active(
                h,
                activity,
                Collidable::default(),
                Vec::new(),
                LocalInertia::default(),
                Isometry::identity(),
                Velocity::default(),
            );
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            let ch = solver.mint_handle();
            solver.insert_payload(
                ch,
                ConstraintPayload {
                    connected_bodies: vec![handles[a], handles[b]],
                    type_id: TypeId(0),
                },
            );
            bodies.active_set_mut().constraints[a].push((ch, 0));
            bodies.active_set_mut().constraints[b].push((ch, 1));
        }

        let mut traversed = IndexSet::new();
        let mut pool = BufferPool::new();
        let island = collect_island(0, &bodies, &solver, &CandidateFilteringPredicate, &mut traversed, &mut pool, 1024, 1024);
        assert!(island.is_none());
    }
}
