//! Extreme-face kernel.

use crate::math::{Point, Real, Vector};
use crate::utils::WSign;

const DEGENERATE_DEN: Real = 1.0e-9;

pub(crate) fn signed_square(y: Real) -> Real {
    y.copy_sign_to(y * y)
}

/// `true` if the `(y, den)` fraction is strictly more counterclockwise from
/// `+by` than `(y_other, den_other)`, compared without division:
/// `sign(y)·y² · den_other  ?  sign(y_other)·y_other² · den`.
pub(crate) fn is_more_extreme(y: Real, den: Real, y_other: Real, den_other: Real) -> bool {
    signed_square(y) * den_other > signed_square(y_other) * den
}

/// One successful extreme-face search: every point found coplanar with the
/// winning direction in the second pass, and the resulting face normal.
pub(crate) struct ExtremeFace {
    pub raw_vertices: Vec<usize>,
    pub face_normal: Vector,
}

/// Finds the point whose `(bx, by)`-projection (relative to origin `o`)
/// makes the smallest counterclockwise angle with `+by`, ignoring
/// `ignore_a`/`ignore_b` and any point coincident with `o`; then collects
/// every point coplanar with the resulting face.
pub(crate) fn find_extreme_face(
    points: &[Point],
    o: Point,
    bx: Vector,
    by: Vector,
    ignore_a: usize,
    ignore_b: usize,
    plane_epsilon: Real,
) -> Option<ExtremeFace> {
    let mut winner: Option<(Real, Real, Real)> = None;

    for (i, p) in points.iter().enumerate() {
        if i == ignore_a || i == ignore_b {
            continue;
        }
        let d = p - o;
        let x = d.dot(&bx);
        let y = d.dot(&by);
        let den = x * x + y * y;
        if den <= DEGENERATE_DEN {
            continue;
        }

        winner = match winner {
            None => Some((x, y, den)),
            Some((_, yw, denw)) if is_more_extreme(y, den, yw, denw) => Some((x, y, den)),
            other => other,
        };
    }

    let (xw, yw, denw) = winner?;
    let inv_len = 1.0 / denw.sqrt();
    let nx = -yw * inv_len;
    let ny = xw * inv_len;
    let face_normal = bx * nx + by * ny;

    let mut raw_vertices = Vec::new();
    for (i, p) in points.iter().enumerate() {
        let dist = (p - o).dot(&face_normal);
        if dist.abs() < plane_epsilon {
            raw_vertices.push(i);
        }
    }

    Some(ExtremeFace { raw_vertices, face_normal })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_x_equals_zero_plane_and_every_coplanar_point() {
        let points = vec![
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(-1.0, 0.0, 0.0),
            Point::new(0.0, -1.0, 0.0),
            Point::new(0.0, 0.0, 5.0),
        ];
        let result = find_extreme_face(
            &points,
            Point::new(0.0, 0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            usize::MAX,
            usize::MAX,
            1.0e-4,
        )
        .unwrap();

        assert_eq!(result.face_normal, Vector::new(-1.0, 0.0, 0.0));
        let mut raw = result.raw_vertices.clone();
        raw.sort_unstable();
        assert_eq!(raw, vec![1, 3, 4]);
    }

    #[test]
    fn ignored_indices_never_win() {
        let points = vec![Point::new(1.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0)];
        let result = find_extreme_face(
            &points,
            Point::new(0.0, 0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            1,
            usize::MAX,
            1.0e-4,
        );
        assert!(result.is_some());
    }
}
