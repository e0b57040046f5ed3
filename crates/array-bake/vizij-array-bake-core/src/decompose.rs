//! Affine decomposition into translation, rotation quaternion and scale.
//!
//! - Translation is read from the last column.
//! - Scale is the length of each basis column. A mirrored basis (negative
//!   3×3 determinant) puts the sign on the X scale instead of the rotation.
//! - Rotation is the quaternion of the normalized basis after Gram-Schmidt.
//!
//! Shear is not recovered. For a sheared basis the Y and Z axes are
//! re-orthogonalized against X, so `to_affine()` only approximates the input.
//! Collapsed (near-zero) axes are rebuilt from the surviving ones.

use log::warn;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::AffineTransform;

/// Basis columns shorter than this are treated as collapsed.
pub const AXIS_EPSILON: f64 = 1e-12;

/// Translation / rotation / scale split of a world transform.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecomposedTransform {
    pub translation: Vector3<f64>,
    /// Quaternion stored as (x, y, z, w).
    pub rotation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl DecomposedTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Recompose as `T * R * S`.
    pub fn to_affine(&self) -> AffineTransform {
        AffineTransform::from_trs(&self.translation, &self.rotation, &self.scale)
    }

    /// Rotation as `[x, y, z, w]`.
    pub fn rotation_xyzw(&self) -> [f64; 4] {
        let c = &self.rotation.coords;
        [c.x, c.y, c.z, c.w]
    }
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Split `affine` into translation, rotation and scale.
pub fn decompose(affine: &AffineTransform) -> DecomposedTransform {
    let translation = affine.translation();
    let mut x = affine.basis_column(0);
    let y = affine.basis_column(1);
    let z = affine.basis_column(2);

    let mut scale = Vector3::new(x.norm(), y.norm(), z.norm());
    if affine.basis_determinant() < 0.0 {
        scale.x = -scale.x;
        x = -x;
    }
    if scale.iter().any(|s| s.abs() <= AXIS_EPSILON) {
        warn!("decompose: collapsed basis axis (scale {scale:?}); rotation is approximate");
    }

    let basis = orthonormal_basis(&x, &y, &z);
    let rotation =
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));

    DecomposedTransform {
        translation,
        rotation,
        scale,
    }
}

/// Right-handed orthonormal basis closest in spirit to `(x, y, z)`: X keeps its
/// direction, Y is made orthogonal to X, Z is `X × Y`.
fn orthonormal_basis(x: &Vector3<f64>, y: &Vector3<f64>, z: &Vector3<f64>) -> Matrix3<f64> {
    let ex = x
        .try_normalize(AXIS_EPSILON)
        .or_else(|| y.cross(z).try_normalize(AXIS_EPSILON))
        .unwrap_or_else(Vector3::x);
    let ey = (y - ex * ex.dot(y))
        .try_normalize(AXIS_EPSILON)
        .or_else(|| z.cross(&ex).try_normalize(AXIS_EPSILON))
        .unwrap_or_else(|| any_orthogonal(&ex));
    let ez = ex.cross(&ey);
    Matrix3::from_columns(&[ex, ey, ez])
}

fn any_orthogonal(v: &Vector3<f64>) -> Vector3<f64> {
    let a = v.abs();
    let axis = if a.x <= a.y && a.x <= a.z {
        Vector3::x()
    } else if a.y <= a.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis).normalize()
}
