//! Math utilities and types
//!
//! Region geometry is computed in double precision so that octant
//! classification of boundary points stays stable across deep subdivisions.

pub use nalgebra::{Vector3, Vector4};

/// 3D vector type used for positions and extents
pub type Vec3 = Vector3<f64>;

/// RGBA color type used by the debug drawing facilities
pub type Vec4 = Vector4<f32>;

/// Half the space diagonal of a unit cube (`sqrt(3) / 2`)
pub const HALF_UNIT_DIAGONAL: f64 = 0.866_025_403_784_438_6;

/// Squared Euclidean distance between two points
#[inline]
pub fn distance_squared(a: &Vec3, b: &Vec3) -> f64 {
    (a - b).norm_squared()
}

/// Check that every component of a vector is finite
#[inline]
pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
