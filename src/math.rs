//! Scalar and vector type aliases shared across the crate: a single place
//! that picks the floating-point width and SIMD lane type, so the rest of
//! the crate stays generic over `Real`.

use na::{Isometry3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "f32")]
/// The scalar type used throughout this crate.
pub type Real = f32;

#[cfg(feature = "simd-is-enabled")]
/// The SIMD scalar type used by the convex hull builder's wide kernels.
pub type SimdReal = simba::simd::WideF32x4;

/// The number of lanes in [`SimdReal`] when the `simd-is-enabled` feature is active.
pub const SIMD_WIDTH: usize = 4;

/// 3D point alias.
pub type Point = Point3<Real>;
/// 3D vector alias.
pub type Vector = Vector3<Real>;
/// Rigid transform alias (rotation + translation), used for body poses.
pub type Isometry = Isometry3<Real>;
/// Rotation alias.
pub type Rotation = UnitQuaternion<Real>;
