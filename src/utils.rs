//! Miscellaneous small helpers shared by the deactivator and the hull builder:
//! sign/cross/dot/basis traits giving the extreme-face kernel its vocabulary
//! (orthonormal basis from a normal, division-free fraction comparisons via
//! cross/dot products).

use na::{Scalar, Vector2, Vector3};

use crate::math::Real;

pub(crate) fn inv(val: Real) -> Real {
    if val == 0.0 {
        0.0
    } else {
        1.0 / val
    }
}

/// Trait to copy the sign of each component of one scalar/vector to another.
///
/// See SIMD implementations of copy_sign here: <https://stackoverflow.com/a/57872652>
pub trait WSign<Rhs>: Sized {
    /// Copy the sign of each component of `self` to the corresponding component of `to`.
    fn copy_sign_to(self, to: Rhs) -> Rhs;
}

impl WSign<Real> for Real {
    fn copy_sign_to(self, to: Self) -> Self {
        const MINUS_ZERO: Real = -0.0;
        let signbit = MINUS_ZERO.to_bits();
        Real::from_bits((signbit & self.to_bits()) | ((!signbit) & to.to_bits()))
    }
}

/// Trait to compute the orthonormal basis of a vector.
///
/// Used to build the `(bx, by)` basis plane orthogonal to a face normal in the
/// convex hull builder's face reduction step.
pub trait WBasis: Sized {
    /// The type of the array of orthonormal vectors.
    type Basis;
    /// Computes the vectors which, when combined with `self`, form an orthonormal basis.
    fn orthonormal_basis(self) -> Self::Basis;
}

impl<N: na::SimdRealField + Copy + WSign<N>> WBasis for Vector3<N> {
    type Basis = [Vector3<N>; 2];

    // Robust and branchless implementation from Pixar:
    // https://graphics.pixar.com/library/OrthonormalB/paper.pdf
    fn orthonormal_basis(self) -> [Vector3<N>; 2] {
        let sign = self.z.copy_sign_to(N::one());
        let a = -N::one() / (sign + self.z);
        let b = self.x * self.y * a;

        [
            Vector3::new(
                N::one() + sign * self.x * self.x * a,
                sign * b,
                -sign * self.x,
            ),
            Vector3::new(b, sign + self.y * self.y * a, -self.y),
        ]
    }
}

pub(crate) trait WDot<Rhs>: Sized {
    type Result;
    fn gdot(&self, rhs: Rhs) -> Self::Result;
}

impl<N: na::SimdRealField + Copy> WDot<Vector3<N>> for Vector3<N> {
    type Result = N;

    fn gdot(&self, rhs: Vector3<N>) -> Self::Result {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
}

impl<N: na::SimdRealField + Copy> WDot<Vector2<N>> for Vector2<N> {
    type Result = N;

    fn gdot(&self, rhs: Vector2<N>) -> Self::Result {
        self.x * rhs.x + self.y * rhs.y
    }
}

pub(crate) trait WCross<Rhs>: Sized {
    type Result;
    fn gcross(&self, rhs: Rhs) -> Self::Result;
}

impl WCross<Vector3<Real>> for Vector3<Real> {
    type Result = Self;

    fn gcross(&self, rhs: Vector3<Real>) -> Self::Result {
        self.cross(&rhs)
    }
}

impl WCross<Vector2<Real>> for Vector2<Real> {
    type Result = Real;

    fn gcross(&self, rhs: Vector2<Real>) -> Self::Result {
        self.x * rhs.y - self.y * rhs.x
    }
}

/// Picks whichever element of `pair` is not equal to `elt`.
///
/// Used by edge expansion to find the "other" endpoint of an edge given one
/// known endpoint.
pub(crate) fn select_other<T: Scalar + PartialEq>(pair: (T, T), elt: T) -> T {
    if pair.0 == elt {
        pair.1
    } else {
        pair.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::Vector3;

    #[test]
    fn orthonormal_basis_is_orthogonal() {
        let n = Vector3::new(0.2f32, 0.6, 0.776).normalize();
        let [bx, by] = n.orthonormal_basis();
        assert_relative_eq!(bx.dot(&n), 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(by.dot(&n), 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(bx.dot(&by), 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(bx.norm(), 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(by.norm(), 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn select_other_picks_the_unequal_element() {
        assert_eq!(select_other((3u32, 7u32), 3), 7);
        assert_eq!(select_other((3u32, 7u32), 7), 3);
    }
}
