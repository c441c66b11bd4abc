//! Convex hull construction from an arbitrary point cloud: vectorized
//! gift-wrapping with a 2D face-reduction pass.

mod bundle;
mod edge_expansion;
mod extreme_face;
mod face_reduction;
mod remap;

pub use bundle::PointBundle;

use crate::data::BufferPool;
use crate::math::{Point, Real, Vector};
use crate::utils::WBasis;

use bundle::{bundle_location, pack_bundles};
use edge_expansion::expand;
use extreme_face::find_extreme_face;
use face_reduction::reduce_face;
use remap::remap;

const COINCIDENT_EPSILON: Real = 1.0e-7;

/// The hull's topology, addressed by original point-cloud indices.
#[derive(Clone, Debug, Default)]
pub struct HullData {
    /// `original_vertex_mapping[i]` is hull vertex `i`'s index in the
    /// source point cloud.
    pub original_vertex_mapping: Vec<usize>,
    /// `face_start_indices[f]` is the inclusive start of face `f` in
    /// `face_vertex_indices`; face `f` ends at `face_start_indices[f + 1]`
    /// or the buffer end.
    pub face_start_indices: Vec<usize>,
    /// Indices into `original_vertex_mapping`.
    pub face_vertex_indices: Vec<usize>,
}

impl HullData {
    /// The number of faces this hull has.
    pub fn face_count(&self) -> usize {
        self.face_start_indices.len()
    }

    /// The vertex range (into `face_vertex_indices`) belonging to face `f`.
    pub fn face_range(&self, f: usize) -> std::ops::Range<usize> {
        let start = self.face_start_indices[f];
        let end = self.face_start_indices.get(f + 1).copied().unwrap_or(self.face_vertex_indices.len());
        start..end
    }
}

/// A bounding plane, `normal` pointing outward and `offset = normal · p` for
/// any point `p` on the plane.
#[derive(Clone, Copy, Debug)]
pub struct FacePlane {
    pub normal: Vector,
    pub offset: Real,
}

/// The fully processed hull: SIMD-bundled points plus per-face vertex
/// indices addressed as `(bundle_index, inner_index)` pairs, and one
/// bounding plane per face.
pub struct ConvexHull {
    pub bundles: Vec<PointBundle>,
    pub face_start_indices: Vec<usize>,
    pub face_vertex_indices: Vec<(usize, usize)>,
    pub planes: Vec<FacePlane>,
}

/// Builds a `HullData` describing the convex hull of `points`.
///
/// Degenerate inputs are handled directly: `n == 0` returns an empty hull,
/// `n <= 3` returns an identity mapping (one triangular face when `n ==
/// 3`), and a cloud whose every point lies within `1e-7` of the centroid
/// collapses to a single-vertex hull.
pub fn compute_hull(points: &[Point], pool: &mut BufferPool) -> HullData {
    if points.is_empty() {
        return HullData::default();
    }

    if points.len() <= 3 {
        let original_vertex_mapping: Vec<usize> = (0..points.len()).collect();
        let (face_start_indices, face_vertex_indices) = if points.len() == 3 {
            (vec![0], vec![0, 1, 2])
        } else {
            (Vec::new(), Vec::new())
        };
        return HullData {
            original_vertex_mapping,
            face_start_indices,
            face_vertex_indices,
        };
    }

    let centroid = centroid_of(points);
    let (v0, farthest_distance) = farthest_from(points, centroid);

    if farthest_distance < COINCIDENT_EPSILON {
        return HullData {
            original_vertex_mapping: vec![v0],
            face_start_indices: Vec::new(),
            face_vertex_indices: Vec::new(),
        };
    }

    let plane_epsilon = 1.0e-6 * farthest_distance;

    // v1, the point farthest from v0, pairs with it to form the point
    // cloud's diameter: a true extremal axis, not an arbitrary one.
    // Rotating the extreme-face search around it (rather than around the
    // centroid->v0 ray) guarantees the first result is a genuine
    // supporting plane instead of a cut through the hull's interior.
    let (v1, edge_length) = farthest_from(points, points[v0]);
    let axis = (points[v1] - points[v0]) / edge_length;
    let [bx, by] = axis.orthonormal_basis();

    let mut allow_vertex: Vec<bool> = pool.take_vec(points.len());
    allow_vertex.resize(points.len(), true);

    let faces = match find_extreme_face(points, points[v0], bx, by, v0, v1, plane_epsilon) {
        Some(seed) => {
            let seed_face = reduce_face(&seed.raw_vertices, seed.face_normal, points, &mut allow_vertex);
            if seed_face.len() >= 2 {
                expand(points, seed_face, seed.face_normal, plane_epsilon, &mut allow_vertex)
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };

    pool.return_vec(allow_vertex);

    let remapped = remap(&faces);
    HullData {
        original_vertex_mapping: remapped.original_vertex_mapping,
        face_start_indices: remapped.face_start_indices,
        face_vertex_indices: remapped.face_vertex_indices,
    }
}

/// Converts a `HullData` into a `ConvexHull`: bundles the surviving points
/// for SIMD consumption, rewrites face-vertex indices as
/// `(bundle_index, inner_index)` pairs, and computes one bounding plane per
/// face.
pub fn process_hull(points: &[Point], hull_data: &HullData, _pool: &mut BufferPool) -> ConvexHull {
    let hull_points: Vec<Point> = hull_data.original_vertex_mapping.iter().map(|&i| points[i]).collect();
    let centroid = if hull_points.is_empty() { Point::origin() } else { centroid_of(&hull_points) };
    let bundles = pack_bundles(&hull_points, centroid);

    let face_vertex_indices: Vec<(usize, usize)> = hull_data.face_vertex_indices.iter().map(|&i| bundle_location(i)).collect();

    let mut planes = Vec::with_capacity(hull_data.face_count());
    for f in 0..hull_data.face_count() {
        let range = hull_data.face_range(f);
        let first_hull_vertex = hull_data.face_vertex_indices[range.start];
        let a = hull_points[first_hull_vertex];
        let b = hull_points[hull_data.face_vertex_indices[range.start + 1]];
        let c = hull_points[hull_data.face_vertex_indices[range.start + 2]];
        let normal = (b - a).cross(&(c - a)).normalize();
        planes.push(FacePlane {
            normal,
            offset: normal.dot(&a.coords),
        });
    }

    ConvexHull {
        bundles,
        face_start_indices: hull_data.face_start_indices.clone(),
        face_vertex_indices,
        planes,
    }
}

fn centroid_of(points: &[Point]) -> Point {
    let sum = points.iter().fold(Vector::zeros(), |acc, p| acc + p.coords);
    Point::from(sum / points.len() as Real)
}

fn farthest_from(points: &[Point], centroid: Point) -> (usize, Real) {
    let mut best_index = 0;
    let mut best_distance_sq = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = (p - centroid).norm_squared();
        if d > best_distance_sq {
            best_distance_sq = d;
            best_index = i;
        }
    }
    (best_index, best_distance_sq.sqrt())
}
