//! SIMD-friendly point bundles.

use crate::math::{Point, SIMD_WIDTH};

/// `SIMD_WIDTH` points packed together, as the hull builder's vectorized
/// kernels would consume them.
///
/// The extreme-face kernel in this crate runs scalar — a correct scalar
/// implementation is acceptable wherever this is used for correctness
/// rather than throughput — but bundling still determines the hull
/// processing step's output addressing, which locates points by
/// `(bundle_index, inner_index)`.
#[derive(Clone, Copy, Debug)]
pub struct PointBundle {
    pub points: [Point; SIMD_WIDTH],
}

/// Packs `points` into bundles of [`SIMD_WIDTH`], padding the final bundle
/// with `centroid` so unused lanes never win an extremum search.
pub(crate) fn pack_bundles(points: &[Point], centroid: Point) -> Vec<PointBundle> {
    let mut bundles = Vec::with_capacity((points.len() + SIMD_WIDTH - 1) / SIMD_WIDTH);
    for chunk in points.chunks(SIMD_WIDTH) {
        let mut lanes = [centroid; SIMD_WIDTH];
        lanes[..chunk.len()].copy_from_slice(chunk);
        bundles.push(PointBundle { points: lanes });
    }
    bundles
}

/// Converts a flat point index into its `(bundle_index, inner_index)` location.
pub(crate) fn bundle_location(index: usize) -> (usize, usize) {
    (index / SIMD_WIDTH, index % SIMD_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_the_last_bundle_with_the_centroid() {
        let centroid = Point::new(0.0, 0.0, 0.0);
        let points = vec![Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0), Point::new(3.0, 0.0, 0.0)];
        let bundles = pack_bundles(&points, centroid);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].points[3], centroid);
    }

    #[test]
    fn bundle_location_matches_width() {
        assert_eq!(bundle_location(0), (0, 0));
        assert_eq!(bundle_location(3), (0, 3));
        assert_eq!(bundle_location(4), (1, 0));
    }
}
