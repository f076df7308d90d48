mod dataset;
pub use dataset::*;
mod error;
pub use error::*;
pub mod geometry;
pub mod trajectory;

use sophus::nalgebra::{Matrix3, Matrix4, Vector3};

pub type Real = f64;
pub type PointCoordinates = Vector3<Real>;
pub type RotationMatrix = Matrix3<Real>;

/// 4x4 rigid-body pose. Rotation in the upper-left 3x3 block, translation in
/// the last column, bottom row `[0, 0, 0, 1]`.
pub type HomogeneousTransform = Matrix4<Real>;

/// Millimetres per metre.
pub const MILLIMETERS_PER_METER: Real = 1000.0;
