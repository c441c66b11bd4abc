//! Duplicate-island reconciliation across workers.

use super::traversal::{Island, WorkerTraversalResults};

/// Filters out islands whose identity body (`body_indices[0]`) was already
/// traversed by a strictly earlier worker.
///
/// Two workers discovering the same connected component must both have
/// visited every body in it; the earlier worker wins. Because a body
/// belongs to at most one component per tick, testing the identity body
/// alone is sufficient.
pub(crate) fn deduplicate(worker_results: &[WorkerTraversalResults]) -> Vec<Island> {
    let mut accepted = Vec::new();

    for (w, result) in worker_results.iter().enumerate() {
        'islands: for island in &result.islands {
            let identity_body = island.body_indices[0];
            for earlier in &worker_results[..w] {
                if earlier.traversed_bodies.contains(identity_body) {
                    continue 'islands;
                }
            }
            accepted.push(island.clone());
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndexSet;

    fn island_with_identity(body: usize) -> Island {
        Island {
            body_indices: vec![body, body + 100],
            proto_batches: Vec::new(),
        }
    }

    #[test]
    fn e3_earlier_worker_wins_duplicate() {
        let mut w0_traversed = IndexSet::new();
        w0_traversed.insert(5);
        let w0 = WorkerTraversalResults {
            traversed_bodies: w0_traversed,
            islands: vec![island_with_identity(5)],
        };

        let mut w1_traversed = IndexSet::new();
        w1_traversed.insert(5);
        let w1 = WorkerTraversalResults {
            traversed_bodies: w1_traversed,
            islands: vec![island_with_identity(5)],
        };

        let accepted = deduplicate(&[w0, w1]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].body_indices[0], 5);
    }

    #[test]
    fn distinct_components_are_both_kept() {
        let mut w0_traversed = IndexSet::new();
        w0_traversed.insert(1);
        let w0 = WorkerTraversalResults {
            traversed_bodies: w0_traversed,
            islands: vec![island_with_identity(1)],
        };

        let mut w1_traversed = IndexSet::new();
        w1_traversed.insert(2);
        let w1 = WorkerTraversalResults {
            traversed_bodies: w1_traversed,
            islands: vec![island_with_identity(2)],
        };

        let accepted = deduplicate(&[w0, w1]);
        assert_eq!(accepted.len(), 2);
    }
}
