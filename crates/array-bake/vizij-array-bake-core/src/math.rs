//! Affine transform value type and frame/instance indices.
//!
//! Matrices follow the column-vector convention: a point `p` maps to `M * p`
//! and translation lives in the last column. `a * b` applies `b` first.

use std::fmt;
use std::ops::{Mul, RangeInclusive};

use nalgebra::{Matrix3, Matrix4, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::BakeError;

/// Host frame number. Frames may be negative.
pub type FrameIndex = i32;

/// Position of an instance along the array chain (0 is the base itself).
pub type InstanceIndex = usize;

/// A 4×4 world transform (translation, rotation, scale, possibly shear).
///
/// Serialized as four rows of four numbers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineTransform(Matrix4<f64>);

impl AffineTransform {
    #[inline]
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    #[inline]
    pub fn from_matrix(m: Matrix4<f64>) -> Self {
        Self(m)
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Build from row-major rows.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(Matrix4::from_fn(|r, c| rows[r][c]))
    }

    /// Row-major rows.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.0[(r, c)];
            }
        }
        rows
    }

    /// Build from 16 row-major values. Returns `None` for any other length.
    pub fn from_row_slice(values: &[f64]) -> Option<Self> {
        if values.len() != 16 {
            return None;
        }
        Some(Self(Matrix4::from_row_slice(values)))
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self(Matrix4::new_translation(&Vector3::new(x, y, z)))
    }

    pub fn from_scale(x: f64, y: f64, z: f64) -> Self {
        Self(Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z)))
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn from_axis_angle(axis: Vector3<f64>, angle: f64) -> Self {
        Self(Matrix4::from_axis_angle(&Unit::new_normalize(axis), angle))
    }

    pub fn from_rotation(q: &UnitQuaternion<f64>) -> Self {
        Self(q.to_homogeneous())
    }

    /// Compose translation, rotation and scale as `T * R * S`.
    pub fn from_trs(
        translation: &Vector3<f64>,
        rotation: &UnitQuaternion<f64>,
        scale: &Vector3<f64>,
    ) -> Self {
        let m = Matrix4::new_translation(translation)
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(scale);
        Self(m)
    }

    /// `self ∘ other`: apply `other`, then `self`.
    #[inline]
    pub fn compose(&self, other: &AffineTransform) -> AffineTransform {
        Self(self.0 * other.0)
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Determinant of the upper-left 3×3 block; negative means mirrored handedness.
    #[inline]
    pub fn basis_determinant(&self) -> f64 {
        self.basis().determinant()
    }

    /// Upper-left 3×3 block (rotation · scale · shear).
    pub fn basis(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Basis column `i` (0 = X axis, 1 = Y axis, 2 = Z axis).
    pub fn basis_column(&self, i: usize) -> Vector3<f64> {
        Vector3::new(self.0[(0, i)], self.0[(1, i)], self.0[(2, i)])
    }

    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.basis_column(3)
    }

    /// Inverse, or `None` when `|det| <= epsilon * |c0| * |c1| * |c2|` over the
    /// basis columns (or the determinant is not finite). The bound is scale
    /// invariant: uniformly tiny transforms still invert, flattened ones do not.
    pub fn try_inverse(&self, epsilon: f64) -> Option<AffineTransform> {
        let det = self.determinant();
        let volume: f64 = (0..3).map(|i| self.basis_column(i).norm()).product();
        if !det.is_finite() || det.abs() <= epsilon * volume {
            return None;
        }
        self.0.try_inverse().map(Self)
    }

    /// Largest absolute component difference.
    pub fn max_abs_diff(&self, other: &AffineTransform) -> f64 {
        (self.0 - other.0).amax()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    fn mul(self, rhs: AffineTransform) -> Self::Output {
        self.compose(&rhs)
    }
}

impl From<Matrix4<f64>> for AffineTransform {
    fn from(m: Matrix4<f64>) -> Self {
        Self(m)
    }
}

impl From<[[f64; 4]; 4]> for AffineTransform {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<AffineTransform> for [[f64; 4]; 4] {
    fn from(t: AffineTransform) -> Self {
        t.to_rows()
    }
}

impl Serialize for AffineTransform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AffineTransform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = <[[f64; 4]; 4]>::deserialize(deserializer)?;
        Ok(Self::from_rows(rows))
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.to_rows();
        write!(f, "[")?;
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[{}, {}, {}, {}]", row[0], row[1], row[2], row[3])?;
        }
        write!(f, "]")
    }
}

/// Inclusive frame range `[start, end]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex,
}

impl FrameRange {
    /// Validated constructor; `start > end` is an `EmptyRange` error.
    pub fn new(start: FrameIndex, end: FrameIndex) -> Result<Self, BakeError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), BakeError> {
        if self.start > self.end {
            return Err(BakeError::EmptyRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Number of frames in the range (0 when malformed).
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end as i64 - self.start as i64 + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames in ascending order.
    pub fn frames(&self) -> RangeInclusive<FrameIndex> {
        self.start..=self.end
    }

    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.start <= frame && frame <= self.end
    }
}
