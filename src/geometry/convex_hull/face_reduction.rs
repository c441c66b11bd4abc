//! 2D gift-wrap face reduction.

use na::Vector2;

use super::extreme_face::signed_square;
use crate::math::{Point, Real, Vector};
use crate::utils::{WBasis, WDot};

const COLLINEAR_EPSILON: Real = 1.0e-6;
const DEGENERATE_DEN: Real = 1.0e-12;

/// Reduces one raw (possibly non-convex, possibly over-long) face vertex
/// list to its convex boundary, fixes winding against `face_normal`, and
/// globally disallows every vertex that didn't survive.
pub(crate) fn reduce_face(raw_vertices: &[usize], face_normal: Vector, points: &[Point], allow_vertex: &mut [bool]) -> Vec<usize> {
    let filtered: Vec<usize> = raw_vertices.iter().copied().filter(|&i| allow_vertex[i]).collect();

    let accepted = if filtered.len() <= 3 {
        let mut result = filtered.clone();
        if result.len() == 3 {
            fix_winding(&mut result, points, face_normal);
        }
        result
    } else {
        gift_wrap_2d(&filtered, face_normal, points)
    };

    for &i in raw_vertices {
        if !accepted.contains(&i) {
            allow_vertex[i] = false;
        }
    }

    accepted
}

fn fix_winding(tri: &mut [usize], points: &[Point], face_normal: Vector) {
    let raw_cross = (points[tri[1]] - points[tri[0]]).cross(&(points[tri[2]] - points[tri[0]]));
    if raw_cross.dot(&face_normal) < 0.0 {
        tri.swap(0, 1);
    }
}

fn gift_wrap_2d(filtered: &[usize], face_normal: Vector, points: &[Point]) -> Vec<usize> {
    let normal = face_normal.normalize();
    let [bx, by] = normal.orthonormal_basis();

    let centroid: Vector = filtered.iter().fold(Vector::zeros(), |acc, &i| acc + points[i].coords) / filtered.len() as Real;

    let project = |i: usize| -> Vector2<Real> {
        let d = points[i].coords - centroid;
        Vector2::new(d.gdot(bx), d.gdot(by))
    };
    let projected: Vec<(usize, Vector2<Real>)> = filtered.iter().map(|&i| (i, project(i))).collect();

    let start = projected
        .iter()
        .max_by(|a, b| a.1.norm_squared().partial_cmp(&b.1.norm_squared()).unwrap())
        .map(|&(i, _)| i)
        .unwrap();

    let start2d = projected.iter().find(|&&(i, _)| i == start).unwrap().1;
    let mut prev_dir = Vector2::new(-start2d.y, start2d.x);
    if prev_dir.norm_squared() < DEGENERATE_DEN {
        prev_dir = Vector2::new(1.0, 0.0);
    }

    let mut polygon = vec![start];
    let mut current = start;

    loop {
        let cur2d = projected.iter().find(|&&(i, _)| i == current).unwrap().1;
        match next_gift_wrap_point(&projected, cur2d, prev_dir, current) {
            Some(next) if next == start => break,
            Some(next) => {
                let next2d = projected.iter().find(|&&(i, _)| i == next).unwrap().1;
                prev_dir = next2d - cur2d;
                polygon.push(next);
                current = next;
            }
            None => break,
        }

        if polygon.len() > filtered.len() {
            // Every point can appear at most once; this guards against a
            // mis-tied wrap looping forever instead of finding `start`.
            break;
        }
    }

    polygon
}

/// Finds the candidate making the smallest counterclockwise angle with
/// `prev_dir` from `origin`, preferring the farther point among
/// near-collinear candidates.
fn next_gift_wrap_point(projected: &[(usize, Vector2<Real>)], origin: Vector2<Real>, prev_dir: Vector2<Real>, exclude: usize) -> Option<usize> {
    let by = prev_dir;
    let bx = Vector2::new(by.y, -by.x);

    let mut winner: Option<(usize, Real, Real, Real)> = None;

    for &(i, p) in projected {
        if i == exclude {
            continue;
        }
        let d = p - origin;
        let x = d.gdot(bx);
        let y = d.gdot(by);
        let den = x * x + y * y;
        if den <= DEGENERATE_DEN {
            continue;
        }

        winner = Some(match winner {
            None => (i, x, y, den),
            Some((wi, xw, yw, denw)) => {
                let metric_c = signed_square(y) * denw;
                let metric_w = signed_square(yw) * den;
                let scale = metric_c.abs().max(metric_w.abs()).max(1.0);
                if metric_c - metric_w > scale * COLLINEAR_EPSILON {
                    (i, x, y, den)
                } else if metric_w - metric_c > scale * COLLINEAR_EPSILON {
                    (wi, xw, yw, denw)
                } else if den > denw {
                    (i, x, y, den)
                } else {
                    (wi, xw, yw, denw)
                }
            }
        });
    }

    winner.map(|(i, ..)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_a_square_to_its_four_corners_in_ccw_order() {
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let mut allow = vec![true; 4];
        let polygon = reduce_face(&[0, 1, 2, 3], Vector::new(0.0, 0.0, 1.0), &points, &mut allow);
        assert_eq!(polygon, vec![3, 0, 1, 2]);
        assert!(allow.iter().all(|&a| a));
    }

    #[test]
    fn triangle_is_accepted_directly_with_winding_fixed() {
        let points = vec![Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0), Point::new(1.0, 0.0, 0.0)];
        let mut allow = vec![true; 3];
        // raw_cross((p1-p0),(p2-p0)) = (0,1,0)x(1,0,0) = (0*0-0*0, 0*1-0*0, 0*0-1*1) = (0,0,-1)
        // dot with face_normal (0,0,1) is negative, so winding must flip.
        let polygon = reduce_face(&[0, 1, 2], Vector::new(0.0, 0.0, 1.0), &points, &mut allow);
        assert_eq!(polygon, vec![1, 0, 2]);
    }

    #[test]
    fn e6_coplanar_quad_with_center_drops_the_center() {
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.5, 0.5, 0.0),
        ];
        let mut allow = vec![true; 5];
        let polygon = reduce_face(&[0, 1, 2, 3, 4], Vector::new(0.0, 0.0, 1.0), &points, &mut allow);
        assert!(!polygon.contains(&4), "the centroid point must not survive the wrap");
        assert!(!allow[4]);
    }
}
