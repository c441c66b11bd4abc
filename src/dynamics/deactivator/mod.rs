//! Island detection and deactivation: the subsystem that periodically scans
//! the active set, finds connected components that have gone quiet, and
//! moves each one into its own sleeping set.

mod dedup;
mod gather;
mod target_selection;
mod traversal;

pub use gather::GatheringJob;
pub use traversal::Island;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::data::{BufferPool, IdPool, IndexSet, ThreadDispatcher};
use crate::dynamics::{Bodies, ConstraintSet, SetId, Solver};

use dedup::deduplicate;
use gather::{build_jobs_for_island, dispatch_gather};
use target_selection::{deterministic_permutation, per_thread_quota, remap_seeds, Schedule};
use traversal::{collect_island, CandidateFilteringPredicate, WorkerTraversalResults};

/// Drives one periodic sleep-detection tick across the active set.
///
/// The tunable fields are the external knobs callers adjust to trade sleep
/// latency against per-tick traversal cost; the defaults are tuned for a
/// moderate-size active set.
pub struct Deactivator {
    /// Fraction of the active set sampled as traversal seeds each tick.
    pub tested_fraction_per_frame: f64,
    /// Soft per-worker quota on how many bodies may be folded into
    /// newly-deactivated islands this tick.
    pub target_deactivated_fraction: f64,
    /// Soft per-worker quota on how many traversal attempts a single
    /// worker may make this tick.
    pub target_traversed_fraction: f64,
    /// Initial body-list capacity reserved for each discovered island.
    pub initial_island_body_capacity: usize,
    /// Initial constraint-handle capacity reserved for each discovered island.
    pub initial_island_constraint_capacity: usize,

    schedule: Schedule,
    set_ids: IdPool,
}

impl Default for Deactivator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deactivator {
    pub fn new() -> Self {
        Self {
            tested_fraction_per_frame: 0.01,
            target_deactivated_fraction: 0.005,
            target_traversed_fraction: 0.02,
            initial_island_body_capacity: 1024,
            initial_island_constraint_capacity: 1024,
            schedule: Schedule::new(),
            set_ids: IdPool::new(),
        }
    }

    /// Drops all accumulated scheduling state, as if this deactivator had
    /// never run a tick.
    pub fn clear(&mut self) {
        self.schedule.reset();
        self.set_ids = IdPool::new();
    }

    /// Grows `bodies`/`solver`'s set storage to hold `set_count` sets.
    pub fn ensure_sets_capacity(&self, bodies: &mut Bodies, solver: &mut Solver, set_count: usize) {
        let highest = self.set_ids.highest_possibly_claimed_id() as usize;
        bodies.ensure_sets_capacity(set_count, highest);
        solver.ensure_sets_capacity(set_count, highest);
    }

    /// Forces `bodies`/`solver`'s set storage to hold at least `set_count`
    /// sets right now, independent of any deactivation tick — for a caller
    /// that wants to preallocate ahead of a burst of deactivations instead
    /// of paying for growth mid-tick.
    pub fn resize_sets_capacity(&self, bodies: &mut Bodies, solver: &mut Solver, set_count: usize) {
        self.ensure_sets_capacity(bodies, solver, set_count);
    }

    /// Runs one deactivation tick: selects seeds, traverses candidate
    /// islands in parallel, deduplicates across workers, then gathers every
    /// accepted island into a freshly allocated sleeping set.
    ///
    /// When `deterministic` is set, seed selection is routed through the
    /// handle-sorted permutation, so the outcome does not depend on the
    /// active set's current memory layout.
    pub fn update(&mut self, bodies: &mut Bodies, solver: &mut Solver, dispatcher: &ThreadDispatcher, deterministic: bool) {
        let active_count = bodies.active_set().len();
        if active_count == 0 {
            return;
        }

        let mut seeds = self.schedule.select_seeds(active_count, self.tested_fraction_per_frame);
        if deterministic {
            let permutation = deterministic_permutation(&bodies.active_set().index_to_handle);
            remap_seeds(&mut seeds, &permutation);
        }

        let worker_count = dispatcher.thread_count();
        let traversed_quota = per_thread_quota(active_count, self.target_traversed_fraction, worker_count);
        let deactivated_quota = per_thread_quota(active_count, self.target_deactivated_fraction, worker_count);

        let worker_results = self.traverse_in_parallel(bodies, solver, dispatcher, &seeds, traversed_quota, deactivated_quota);
        let accepted_islands = deduplicate(&worker_results);

        // Every worker's scratch state lives on past `deduplicate` (which
        // reads `traversed_bodies`), but nothing downstream needs it after
        // this point — hand it back to the worker that allocated it.
        for (worker_index, result) in worker_results.into_iter().enumerate() {
            let WorkerTraversalResults { traversed_bodies, islands } = result;
            let mut pool = dispatcher.thread_buffer_pool(worker_index).borrow_mut();
            pool.return_val(traversed_bodies);
            pool.return_vec(islands);
        }

        if accepted_islands.is_empty() {
            return;
        }

        self.gather_islands(bodies, solver, dispatcher, &accepted_islands);
    }

    fn traverse_in_parallel(
        &self,
        bodies: &Bodies,
        solver: &Solver,
        dispatcher: &ThreadDispatcher,
        seeds: &[usize],
        traversed_quota: usize,
        deactivated_quota: usize,
    ) -> Vec<WorkerTraversalResults> {
        let worker_count = dispatcher.thread_count();
        let active_len = bodies.active_set().len();
        let results: Vec<Mutex<WorkerTraversalResults>> = (0..worker_count)
            .map(|i| {
                let mut pool = dispatcher.thread_buffer_pool(i).borrow_mut();
                let mut traversed_bodies: IndexSet = pool.take();
                traversed_bodies.clear();
                if traversed_bodies.capacity() < active_len {
                    traversed_bodies = IndexSet::with_capacity(active_len);
                }
                let islands: Vec<Island> = pool.take_vec(seeds.len() / worker_count.max(1) + 1);
                Mutex::new(WorkerTraversalResults { traversed_bodies, islands })
            })
            .collect();
        let seed_cursor = AtomicUsize::new(0);
        let predicate = CandidateFilteringPredicate;

        dispatcher.dispatch_workers(|worker_index| {
            let mut result = results[worker_index].lock().unwrap();
            let mut pool = dispatcher.thread_buffer_pool(worker_index).borrow_mut();
            let mut deactivated_count = 0usize;
            let mut attempts = 0usize;

            loop {
                if deactivated_count >= deactivated_quota || attempts >= traversed_quota {
                    break;
                }

                let idx = seed_cursor.fetch_add(1, Ordering::SeqCst);
                if idx >= seeds.len() {
                    break;
                }
                let seed = seeds[idx];

                if result.traversed_bodies.contains(seed) {
                    continue;
                }
                attempts += 1;

                let traversed_bodies = &mut result.traversed_bodies;
                if let Some(island) = collect_island(
                    seed,
                    bodies,
                    solver,
                    &predicate,
                    traversed_bodies,
                    &mut pool,
                    self.initial_island_body_capacity,
                    self.initial_island_constraint_capacity,
                ) {
                    deactivated_count += island.body_indices.len();
                    result.islands.push(island);
                }
            }
        });

        results.into_iter().map(|m| m.into_inner().unwrap()).collect()
    }

    fn gather_islands(&mut self, bodies: &mut Bodies, solver: &mut Solver, dispatcher: &ThreadDispatcher, islands: &[Island]) {
        // Single-threaded bookkeeping before the fan-out below; borrow
        // worker 0's pool for it rather than allocating directly.
        let mut pool = dispatcher.thread_buffer_pool(0).borrow_mut();

        let mut target_sets: Vec<SetId> = pool.take_vec(islands.len());
        target_sets.extend(islands.iter().map(|_| SetId(self.set_ids.take())));

        let highest_target = target_sets.iter().map(|s| s.index()).max().unwrap_or(0);
        self.ensure_sets_capacity(bodies, solver, highest_target);

        for (island, &target_set) in islands.iter().zip(&target_sets) {
            bodies.sets[target_set.index()].reserve_exact(island.body_indices.len());
            solver.sets[target_set.index()] = ConstraintSet::shaped_from(&island.proto_batches);
        }

        let mut jobs: Vec<GatheringJob> = pool.take_vec(islands.len());
        for (island_index, (island, &target_set)) in islands.iter().zip(&target_sets).enumerate() {
            jobs.extend(build_jobs_for_island(island_index, island, target_set));
        }
        drop(pool);

        dispatch_gather(dispatcher, &jobs, islands, bodies, solver);

        for (island, &target_set) in islands.iter().zip(&target_sets) {
            for (target_index, &source_index) in island.body_indices.iter().enumerate() {
                let handle = bodies.active_set().index_to_handle[source_index];
                bodies.set_location(handle, (target_set, target_index));
            }
        }

        let mut pool = dispatcher.thread_buffer_pool(0).borrow_mut();
        pool.return_vec(jobs);
        pool.return_vec(target_sets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::body::{BodyActivity, Collidable, LocalInertia, Velocity};
    use crate::dynamics::solver_set::ConstraintPayload;
    use crate::dynamics::TypeId;
    use crate::math::Isometry;

    fn square_fixture() -> (Bodies, Solver, Vec<crate::dynamics::BodyHandle>) {
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
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
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
        (bodies, solver, handles)
    }

    #[test]
    fn update_with_no_active_bodies_is_a_no_op() {
        let mut bodies = Bodies::new();
        let mut solver = Solver::new();
        let dispatcher = ThreadDispatcher::new(1);
        let mut deactivator = Deactivator::new();
        deactivator.update(&mut bodies, &mut solver, &dispatcher, false);
        assert_eq!(bodies.sets.len(), 1);
    }

    #[test]
    fn update_moves_a_fully_candidate_square_into_a_sleeping_set() {
        let (mut bodies, mut solver, handles) = square_fixture();
        let dispatcher = ThreadDispatcher::new(1);
        let mut deactivator = Deactivator::new();
        deactivator.tested_fraction_per_frame = 1.0;
        deactivator.target_deactivated_fraction = 1.0;
        deactivator.target_traversed_fraction = 1.0;

        deactivator.update(&mut bodies, &mut solver, &dispatcher, false);

        assert_eq!(bodies.sets.len(), 2, "one sleeping set must have been allocated");
        assert_eq!(bodies.sets[1].len(), 4, "every body in the square must have gathered");

        for &h in &handles {
            let (set_id, _) = bodies.handle_to_location(h).unwrap();
            assert_eq!(set_id, SetId(1));
        }
    }

    #[test]
    fn e4_deterministic_permutation_decouples_from_memory_order() {
        let mut bodies_a = Bodies::new();
        let handles: Vec<_> = (0..4).map(|_| bodies_a.mint_handle()).collect();
        for &h in &handles {
            bodies_a.add_active(
                h,
                BodyActivity::candidate(),
                Collidable::default(),
                Vec::new(),
                LocalInertia::default(),
                Isometry::identity(),
                Velocity::default(),
            );
        }

        let mut bodies_b = Bodies::new();
        for &h in handles.iter().rev() {
            bodies_b.add_active(
                h,
                BodyActivity::candidate(),
                Collidable::default(),
                Vec::new(),
                LocalInertia::default(),
                Isometry::identity(),
                Velocity::default(),
            );
        }

        let perm_a = deterministic_permutation(&bodies_a.active_set().index_to_handle);
        let perm_b = deterministic_permutation(&bodies_b.active_set().index_to_handle);

        let sorted_handles_a: Vec<_> = perm_a.iter().map(|&i| bodies_a.active_set().index_to_handle[i]).collect();
        let sorted_handles_b: Vec<_> = perm_b.iter().map(|&i| bodies_b.active_set().index_to_handle[i]).collect();
        assert_eq!(sorted_handles_a, sorted_handles_b, "same handle set must sort identically regardless of array position");
    }

    #[test]
    fn clear_resets_scheduling_state() {
        let mut deactivator = Deactivator::new();
        deactivator.schedule.select_seeds(10, 0.5);
        deactivator.clear();

        let mut fresh = Schedule::new();
        assert_eq!(deactivator.schedule.select_seeds(10, 0.5), fresh.select_seeds(10, 0.5));
    }
}
