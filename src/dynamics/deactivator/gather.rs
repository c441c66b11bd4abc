//! Parallel gather: copying an accepted island's payload from the active
//! set into its freshly allocated inactive set.

use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::data::ThreadDispatcher;
use crate::dynamics::{Bodies, SetId, Solver};

use super::traversal::Island;

/// One unit of gather work: either a contiguous range of an island's body
/// list, or a range of one type-batch's constraint-handle list.
#[derive(Clone, Copy, Debug)]
pub enum GatheringJob {
    Body {
        island_index: usize,
        target_set: SetId,
        start: usize,
        end: usize,
    },
    Constraint {
        island_index: usize,
        target_set: SetId,
        /// Which of the island's proto-batches this job's source
        /// type-batch belongs to.
        proto_batch_index: usize,
        /// The type-batch's position within that proto-batch.
        type_batch_index: usize,
        /// The same type-batch's position in the target `ConstraintSet`,
        /// whose `type_batches` are flattened across every proto-batch by
        /// `ConstraintSet::shaped_from`.
        target_type_batch_index: usize,
        start: usize,
        end: usize,
    },
}

/// Splits `[0, count)` into `max(1, count / chunk)` contiguous ranges, the
/// first `count % chunk` of which get one extra element. Body gather and
/// constraint gather both partition their work this way.
pub(crate) fn partition_ranges(count: usize, chunk: usize) -> Vec<(usize, usize)> {
    if count == 0 {
        return Vec::new();
    }

    let num_ranges = (count / chunk.max(1)).max(1);
    let base = count / num_ranges;
    let remainder = count % num_ranges;

    let mut ranges = Vec::with_capacity(num_ranges);
    let mut start = 0;
    for i in 0..num_ranges {
        let len = base + if i < remainder { 1 } else { 0 };
        ranges.push((start, start + len));
        start += len;
    }
    ranges
}

/// Builds the job list for one accepted island: body-gather jobs over
/// `[0, |body_indices|)`, plus one constraint-gather job per type-batch
/// range.
pub(crate) fn build_jobs_for_island(island_index: usize, island: &Island, target_set: SetId) -> Vec<GatheringJob> {
    const CHUNK: usize = 32;
    let mut jobs = Vec::new();

    for (start, end) in partition_ranges(island.body_indices.len(), CHUNK) {
        jobs.push(GatheringJob::Body {
            island_index,
            target_set,
            start,
            end,
        });
    }

    let mut target_type_batch_index = 0;
    for (proto_batch_index, proto) in island.proto_batches.iter().enumerate() {
        for (type_batch_index, type_batch) in proto.type_batches.iter().enumerate() {
            for (start, end) in partition_ranges(type_batch.constraint_handles.len(), CHUNK) {
                jobs.push(GatheringJob::Constraint {
                    island_index,
                    target_set,
                    proto_batch_index,
                    type_batch_index,
                    target_type_batch_index,
                    start,
                    end,
                });
            }
            target_type_batch_index += 1;
        }
    }

    jobs
}

/// Executes every job in `jobs` across the dispatcher's workers, mutating
/// `bodies` and `solver` in place.
///
/// # Safety / disjointness argument
///
/// Every job's `(target_set, range)` (body jobs) or `(target_set,
/// type_batch_index, range)` (constraint jobs) is disjoint from every
/// other job's by construction: [`build_jobs_for_island`] partitions each
/// island's body list and each type-batch's handle list into
/// non-overlapping ranges, and distinct islands always get distinct
/// `target_set` ids freshly taken from the id pool. Workers therefore
/// never write the same memory concurrently, even though they reach it
/// through raw pointers derived from one shared `&mut`.
pub(crate) fn dispatch_gather(
    dispatcher: &ThreadDispatcher,
    jobs: &[GatheringJob],
    islands: &[Island],
    bodies: &mut Bodies,
    solver: &mut Solver,
) {
    if jobs.is_empty() {
        return;
    }

    let job_index = AtomicUsize::new(0);
    let bodies_ptr = AtomicPtr::new(bodies as *mut Bodies);
    let solver_ptr = AtomicPtr::new(solver as *mut Solver);

    dispatcher.dispatch_workers(|_worker_index| {
        // SAFETY: see the disjointness argument in this function's doc comment.
        let bodies: &mut Bodies = unsafe { &mut *bodies_ptr.load(Ordering::Relaxed) };
        let solver: &mut Solver = unsafe { &mut *solver_ptr.load(Ordering::Relaxed) };

        loop {
            let idx = job_index.fetch_add(1, Ordering::SeqCst);
            if idx >= jobs.len() {
                break;
            }
            execute_job(&jobs[idx], islands, bodies, solver);
        }
    });
}

fn execute_job(job: &GatheringJob, islands: &[Island], bodies: &mut Bodies, solver: &mut Solver) {
    match *job {
        GatheringJob::Body {
            island_index,
            target_set,
            start,
            end,
        } => {
            let island = &islands[island_index];
            // SAFETY: `target_set` always differs from `SetId::ACTIVE` for a
            // gather job, so splitting the active (source) set and the
            // target set out of `bodies.sets` never aliases the same slot.
            let (source, target) = split_sets_mut(bodies, SetId::ACTIVE, target_set);
            for target_index in start..end {
                let source_index = island.body_indices[target_index];
                source.copy_into(source_index, target, target_index);
            }
        }
        GatheringJob::Constraint {
            island_index,
            target_set,
            proto_batch_index,
            type_batch_index,
            target_type_batch_index,
            start,
            end,
        } => {
            let island = &islands[island_index];
            let type_batch = &island.proto_batches[proto_batch_index].type_batches[type_batch_index];
            let type_id = type_batch.type_id;
            let source_handles = &type_batch.constraint_handles;

            let target_constraint_set = &mut solver.sets[target_set.index()];
            let target_type_batch = &mut target_constraint_set.type_batches[target_type_batch_index];

            match solver.processor_for(type_id) {
                Some(processor) => processor.gather_active_constraints(source_handles, start, end, target_type_batch),
                None => {
                    target_type_batch.constraint_handles[start..end]
                        .copy_from_slice(&source_handles[start..end]);
                }
            }
        }
    }
}

/// Splits `bodies.sets` into `(&active set, &mut target set)`.
///
/// `source` and `target` are always distinct ids for a real gather job
/// (the active set is never its own gather target), so this never needs
/// to alias the same slot twice.
fn split_sets_mut(
    bodies: &mut Bodies,
    source: SetId,
    target: SetId,
) -> (&crate::dynamics::BodySet, &mut crate::dynamics::BodySet) {
    debug_assert_ne!(source, target);
    let (lo, hi) = if source.index() < target.index() {
        (source.index(), target.index())
    } else {
        (target.index(), source.index())
    };
    let (left, right) = bodies.sets.split_at_mut(hi);
    if source.index() < target.index() {
        (&left[lo], &mut right[0])
    } else {
        (&right[0], &mut left[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_ranges_distributes_remainder_to_first_chunks() {
        let ranges = partition_ranges(10, 3);
        assert_eq!(ranges.len(), 3);
        let lens: Vec<usize> = ranges.iter().map(|&(s, e)| e - s).collect();
        assert_eq!(lens.iter().sum::<usize>(), 10);
        assert_eq!(lens, vec![4, 3, 3]);
    }

    #[test]
    fn partition_ranges_of_small_count_is_one_range() {
        let ranges = partition_ranges(5, 32);
        assert_eq!(ranges, vec![(0, 5)]);
    }

    #[test]
    fn partition_ranges_of_zero_is_empty() {
        assert!(partition_ranges(0, 32).is_empty());
    }
}
