//! Rigid-body transform primitives.
//!
//! Quaternions are carried internally as `[w, x, y, z]` (scalar first). Files
//! and devices that store the scalar last go through
//! [`quaternion_axis_order_convert`] at the boundary.

use sophus::nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::{HomogeneousTransform, MocapError, PointCoordinates, Real, Result, RotationMatrix};

/// Below this norm a quaternion carries no usable rotation.
const MINIMUM_QUATERNION_NORM: Real = 1e-9;

/// Norm deviation from 1.0 that is reported when normalizing.
const UNIT_NORM_TOLERANCE: Real = 1e-3;

/// Component order of a 4-vector quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuaternionOrder {
    /// `[w, x, y, z]`, the internal convention.
    ScalarFirst,
    /// `[x, y, z, w]`, as exported by the mocap software.
    ScalarLast,
}

/// Reorders `q` from one component convention to another.
pub fn quaternion_axis_order_convert(
    q: [Real; 4],
    from: QuaternionOrder,
    to: QuaternionOrder,
) -> [Real; 4] {
    match (from, to) {
        (QuaternionOrder::ScalarFirst, QuaternionOrder::ScalarLast) => [q[1], q[2], q[3], q[0]],
        (QuaternionOrder::ScalarLast, QuaternionOrder::ScalarFirst) => [q[3], q[0], q[1], q[2]],
        _ => q,
    }
}

/// Builds a unit quaternion from scalar-first components, normalizing them.
pub fn unit_quaternion(q: [Real; 4]) -> Result<UnitQuaternion<Real>> {
    let quaternion = Quaternion::new(q[0], q[1], q[2], q[3]);
    let norm = quaternion.norm();
    if !norm.is_finite() || norm < MINIMUM_QUATERNION_NORM {
        return Err(MocapError::DegenerateQuaternion { norm });
    }
    if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
        log::debug!("normalizing quaternion {q:?} with norm {norm}");
    }
    Ok(UnitQuaternion::from_quaternion(quaternion))
}

/// Scalar-first components of a unit quaternion.
pub fn quaternion_components(q: &UnitQuaternion<Real>) -> [Real; 4] {
    [q.w, q.i, q.j, q.k]
}

pub fn compose_transform(
    rotation: &RotationMatrix,
    translation: &PointCoordinates,
) -> HomogeneousTransform {
    let mut transform = HomogeneousTransform::identity();
    transform.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    transform.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    transform
}

pub fn rotation_of(transform: &HomogeneousTransform) -> RotationMatrix {
    transform.fixed_view::<3, 3>(0, 0).into_owned()
}

pub fn translation_of(transform: &HomogeneousTransform) -> PointCoordinates {
    transform.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Position plus scalar-first quaternion to a homogeneous transform.
pub fn pos_quat_to_transform(
    position: &PointCoordinates,
    quaternion: [Real; 4],
) -> Result<HomogeneousTransform> {
    let rotation = unit_quaternion(quaternion)?.to_rotation_matrix().into_inner();
    Ok(compose_transform(&rotation, position))
}

/// Rotation-only transform `Rz(yaw) * Ry(pitch) * Rx(roll)`, angles in degrees.
pub fn yaw_pitch_roll(yaw_deg: Real, pitch_deg: Real, roll_deg: Real) -> HomogeneousTransform {
    let (sy, cy) = yaw_deg.to_radians().sin_cos();
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    let (sr, cr) = roll_deg.to_radians().sin_cos();

    #[rustfmt::skip]
    let rz = Matrix3::new(
        cy, -sy, 0.0,
        sy, cy, 0.0,
        0.0, 0.0, 1.0,
    );
    #[rustfmt::skip]
    let ry = Matrix3::new(
        cp, 0.0, sp,
        0.0, 1.0, 0.0,
        -sp, 0.0, cp,
    );
    #[rustfmt::skip]
    let rx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, cr, -sr,
        0.0, sr, cr,
    );

    compose_transform(&(rz * ry * rx), &Vector3::zeros())
}

/// Exact inverse of a rigid transform: `[R^T | -R^T t]`.
pub fn invert_transform(transform: &HomogeneousTransform) -> HomogeneousTransform {
    let rotation_t = rotation_of(transform).transpose();
    let translation = -(rotation_t * translation_of(transform));
    compose_transform(&rotation_t, &translation)
}

/// True when the rotation block is orthonormal with determinant +1 and the
/// bottom row is `[0, 0, 0, 1]`, all within `epsilon`.
pub fn is_rigid_transform(transform: &HomogeneousTransform, epsilon: Real) -> bool {
    let rotation = rotation_of(transform);
    let orthonormal = (rotation.transpose() * rotation - RotationMatrix::identity())
        .iter()
        .all(|v| v.abs() <= epsilon);
    let bottom_row = [0.0, 0.0, 0.0, 1.0]
        .iter()
        .enumerate()
        .all(|(col, expected)| (transform[(3, col)] - expected).abs() <= epsilon);
    orthonormal && bottom_row && (rotation.determinant() - 1.0).abs() <= epsilon
}
