// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Matrix primitives used by the transform stack.
//!
//! Dense 4×4 arithmetic is delegated to [`euclid`]; this module only pins the
//! scalar type and coordinate spaces, and adds the handful of constructors the
//! stack needs that `euclid` spells differently (degree-based axis rotations,
//! heading/pitch/roll Euler angles, OpenGL-style projections) plus
//! conversions to and from 2D [`kurbo::Affine`] transforms.
//!
//! # Multiplication order
//!
//! `euclid` uses row vectors, so `a.then(&b)` transforms a point by `a` first
//! and by `b` second. The stack post-multiplies every new operation onto the
//! accumulated transform in column-vector terms (`M' = M · Op`), which is
//! [`compose_onto`]: `op.then(&accum)`. The newest operation therefore acts on
//! points before everything that was accumulated earlier.

use core::f64::consts::PI;

use euclid::Angle;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Dense 4×4 transform.
pub type Matrix = euclid::default::Transform3D<f64>;

/// Rotation expressed as a quaternion.
pub type Quaternion = euclid::default::Rotation3D<f64>;

/// A 3D displacement.
pub type Vector = euclid::default::Vector3D<f64>;

/// Rotation expressed as heading, pitch and roll, in degrees.
///
/// Heading turns about the Y axis, pitch about the X axis and roll about the
/// Z axis. Roll is applied to points first, then pitch, then heading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Euler {
    /// Rotation about the Y axis.
    pub heading: f64,
    /// Rotation about the X axis.
    pub pitch: f64,
    /// Rotation about the Z axis.
    pub roll: f64,
}

impl Euler {
    /// Creates an Euler rotation from heading, pitch and roll in degrees.
    #[inline]
    #[must_use]
    pub const fn new(heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            heading,
            pitch,
            roll,
        }
    }

    /// Returns the rotation as a dense matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix {
        axis_angle(self.roll, 0.0, 0.0, 1.0)
            .then(&axis_angle(self.pitch, 1.0, 0.0, 0.0))
            .then(&axis_angle(self.heading, 0.0, 1.0, 0.0))
    }
}

/// Post-multiplies `op` onto `accum`, so `op` applies to points first.
#[inline]
#[must_use]
pub fn compose_onto(accum: &Matrix, op: &Matrix) -> Matrix {
    op.then(accum)
}

/// Rotation of `degrees` about the axis `(x, y, z)`.
///
/// The axis does not need to be normalized. A zero-length axis yields the
/// identity.
#[must_use]
pub fn axis_angle(degrees: f64, x: f64, y: f64, z: f64) -> Matrix {
    let len = (x * x + y * y + z * z).sqrt();
    if len == 0.0 || !len.is_finite() {
        return Matrix::identity();
    }
    Matrix::rotation(x / len, y / len, z / len, Angle::degrees(degrees))
}

/// Converts a quaternion to a dense rotation matrix.
///
/// The quaternion is normalized first; a zero quaternion yields the identity.
#[must_use]
pub fn quaternion_matrix(q: &Quaternion) -> Matrix {
    let norm = (q.i * q.i + q.j * q.j + q.k * q.k + q.r * q.r).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Matrix::identity();
    }
    Quaternion::quaternion(q.i / norm, q.j / norm, q.k / norm, q.r / norm).to_transform()
}

/// Perspective frustum with OpenGL clip-space conventions.
#[must_use]
pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, z_near: f64, z_far: f64) -> Matrix {
    let x = (2.0 * z_near) / (right - left);
    let y = (2.0 * z_near) / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = -(z_far + z_near) / (z_far - z_near);
    let d = -(2.0 * z_far * z_near) / (z_far - z_near);

    // Row-vector layout: the transpose of the usual column-vector matrix.
    Matrix::new(
        x, 0.0, 0.0, 0.0, //
        0.0, y, 0.0, 0.0, //
        a, b, c, -1.0, //
        0.0, 0.0, d, 0.0,
    )
}

/// Symmetric perspective projection from a vertical field of view in degrees.
#[must_use]
pub fn perspective(fov_y: f64, aspect: f64, z_near: f64, z_far: f64) -> Matrix {
    let ymax = z_near * (fov_y * PI / 360.0).tan();
    frustum(-ymax * aspect, ymax * aspect, -ymax, ymax, z_near, z_far)
}

/// Orthographic projection mapping the box from `(x_1, y_1)` to `(x_2, y_2)` onto clip
/// space, where `(x_1, y_1)` is the top-left corner.
#[must_use]
pub fn orthographic(x_1: f64, y_1: f64, x_2: f64, y_2: f64, near: f64, far: f64) -> Matrix {
    let (left, right, top, bottom) = (x_1, x_2, y_1, y_2);
    let tx = -(right + left) / (right - left);
    let ty = -(top + bottom) / (top - bottom);
    let tz = -(far + near) / (far - near);

    Matrix::new(
        2.0 / (right - left),
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 / (top - bottom),
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 / (far - near),
        0.0,
        tx,
        ty,
        tz,
        1.0,
    )
}

/// Lifts a 2D affine transform into the XY plane.
#[must_use]
pub fn from_affine(affine: kurbo::Affine) -> Matrix {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Matrix::new(
        a, b, 0.0, 0.0, //
        c, d, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        e, f, 0.0, 1.0,
    )
}

/// Projects a matrix back to a 2D affine transform.
///
/// Returns `None` if the matrix has any Z or perspective component, i.e. if
/// it is not the lift of some affine transform.
#[must_use]
pub fn to_affine(m: &Matrix) -> Option<kurbo::Affine> {
    let flat = m.m13 == 0.0
        && m.m14 == 0.0
        && m.m23 == 0.0
        && m.m24 == 0.0
        && m.m31 == 0.0
        && m.m32 == 0.0
        && m.m33 == 1.0
        && m.m34 == 0.0
        && m.m43 == 0.0
        && m.m44 == 1.0;
    flat.then(|| kurbo::Affine::new([m.m11, m.m12, m.m21, m.m22, m.m41, m.m42]))
}

/// Is every element of this matrix [finite]?
///
/// [finite]: f64::is_finite
#[must_use]
pub fn is_finite(m: &Matrix) -> bool {
    m.to_array().iter().all(|v| v.is_finite())
}
