//! Edge-stack expansion: grows the accepted face set until every boundary
//! edge is shared by exactly two faces.

use rustc_hash::{FxHashMap, FxHashSet};

use super::extreme_face::find_extreme_face;
use super::face_reduction::reduce_face;
use crate::math::{Point, Real, Vector};
use crate::utils::WCross;

/// One accepted face: its reduced, correctly-wound vertex loop and its
/// outward normal.
pub(crate) struct Face {
    pub vertices: Vec<usize>,
    pub normal: Vector,
}

/// Unordered edge key; `(a, b)` and `(b, a)` must hash and compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeKey(usize, usize);

impl EdgeKey {
    fn new(a: usize, b: usize) -> Self {
        if a < b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

struct PendingEdge {
    a: usize,
    b: usize,
    parent_normal: Vector,
}

/// Runs edge expansion starting from `seed_face`, returning every accepted
/// face.
pub(crate) fn expand(points: &[Point], seed_face: Vec<usize>, seed_normal: Vector, plane_epsilon: Real, allow_vertex: &mut [bool]) -> Vec<Face> {
    let mut faces = Vec::new();
    let mut edge_face_counts: FxHashMap<EdgeKey, u8> = FxHashMap::default();
    let mut accepted_vertex_sets: FxHashSet<Vec<usize>> = FxHashSet::default();
    let mut stack = Vec::new();

    push_face_edges(&seed_face, seed_normal, &mut edge_face_counts, &mut stack);
    if seed_face.len() >= 3 && mark_accepted(&mut accepted_vertex_sets, &seed_face) {
        faces.push(Face {
            vertices: seed_face,
            normal: seed_normal,
        });
    }

    while let Some(edge) = stack.pop() {
        let key = EdgeKey::new(edge.a, edge.b);
        if *edge_face_counts.get(&key).unwrap_or(&0) >= 2 {
            continue;
        }

        let p_a = points[edge.a];
        let p_b = points[edge.b];
        let edge_offset = p_b - p_a;
        if edge_offset.norm_squared() < 1.0e-16 {
            continue;
        }

        // `basis_y` points away from the parent face; `basis_x` points inward.
        let basis_y = edge_offset.gcross(edge.parent_normal);
        let basis_x = edge_offset.gcross(basis_y);
        let by = basis_y.normalize();
        let bx = basis_x.normalize();

        let Some(extreme) = find_extreme_face(points, p_a, bx, by, edge.a, edge.b, plane_epsilon) else {
            // Degenerate: no point found beyond the edge. Mark the edge's
            // own endpoints disallowed so no other face resurrects them
            // through this dead end.
            allow_vertex[edge.a] = false;
            allow_vertex[edge.b] = false;
            continue;
        };

        let reduced = reduce_face(&extreme.raw_vertices, extreme.face_normal, points, allow_vertex);
        if reduced.len() < 3 {
            continue;
        }

        // A face already reached from an earlier edge on the stack must
        // not be counted twice: its own edges would otherwise be pushed
        // again and its vertex set duplicated in the output.
        if !mark_accepted(&mut accepted_vertex_sets, &reduced) {
            continue;
        }

        push_face_edges(&reduced, extreme.face_normal, &mut edge_face_counts, &mut stack);
        faces.push(Face {
            vertices: reduced,
            normal: extreme.face_normal,
        });
    }

    faces
}

/// Records `face`'s vertex set (order-independent) as accepted, returning
/// `false` if an equivalent set was already recorded.
fn mark_accepted(accepted_vertex_sets: &mut FxHashSet<Vec<usize>>, face: &[usize]) -> bool {
    let mut key = face.to_vec();
    key.sort_unstable();
    accepted_vertex_sets.insert(key)
}

fn push_face_edges(face: &[usize], normal: Vector, edge_face_counts: &mut FxHashMap<EdgeKey, u8>, stack: &mut Vec<PendingEdge>) {
    if face.len() < 2 {
        return;
    }
    let len = face.len();
    for i in 0..len {
        let a = face[i];
        let b = face[(i + 1) % len];
        if a == b {
            continue;
        }
        let key = EdgeKey::new(a, b);
        let count = edge_face_counts.entry(key).or_insert(0);
        if *count == 0 {
            *count = 1;
            stack.push(PendingEdge { a, b, parent_normal: normal });
        } else {
            *count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_order_independent() {
        assert_eq!(EdgeKey::new(3, 7), EdgeKey::new(7, 3));
    }

    #[test]
    fn e5_cube_expands_to_six_faces() {
        let points = vec![
            Point::new(-0.5, -0.5, -0.5),
            Point::new(0.5, -0.5, -0.5),
            Point::new(0.5, 0.5, -0.5),
            Point::new(-0.5, 0.5, -0.5),
            Point::new(-0.5, -0.5, 0.5),
            Point::new(0.5, -0.5, 0.5),
            Point::new(0.5, 0.5, 0.5),
            Point::new(-0.5, 0.5, 0.5),
        ];

        let mut allow_vertex = vec![true; points.len()];
        let seed_face = vec![0, 1, 2, 3];
        let seed_normal = Vector::new(0.0, 0.0, -1.0);

        let faces = expand(&points, seed_face, seed_normal, 1.0e-4, &mut allow_vertex);

        assert_eq!(faces.len(), 6, "a cube must expand to exactly six faces");

        let mut edge_counts: FxHashMap<EdgeKey, u8> = FxHashMap::default();
        for face in &faces {
            let len = face.vertices.len();
            for i in 0..len {
                let key = EdgeKey::new(face.vertices[i], face.vertices[(i + 1) % len]);
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }
        assert_eq!(edge_counts.len(), 12, "a cube has twelve edges");
        for count in edge_counts.values() {
            assert_eq!(*count, 2, "every edge must end up shared by exactly two faces");
        }
    }
}
