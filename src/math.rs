use glam::{DMat3, DMat4, DVec3};

use crate::error::Error;

/// Matrices whose determinant magnitude falls below this threshold are
/// treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-14;

/// The axis order in which FBX composes Euler rotations. The discriminant
/// values match the `RotationOrder` enum property stored in the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yzx,
    Yxz,
    Zxy,
    Zyx,
}

impl RotationOrder {
    /// Maps the integer stored in the `RotationOrder` property. Unknown
    /// indices behave as `Xyz`.
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => Self::Xzy,
            2 => Self::Yzx,
            3 => Self::Yxz,
            4 => Self::Zxy,
            5 => Self::Zyx,
            _ => Self::Xyz,
        }
    }
}

/// Composes a rotation matrix from Euler angles in degrees. The named axes
/// apply to column vectors in declaration order, so `Xyz` yields the product
/// `Z * Y * X`.
pub fn euler_matrix(degrees: DVec3, order: RotationOrder) -> DMat4 {
    let x = DMat4::from_rotation_x(degrees.x.to_radians());
    let y = DMat4::from_rotation_y(degrees.y.to_radians());
    let z = DMat4::from_rotation_z(degrees.z.to_radians());

    match order {
        RotationOrder::Xyz => z * y * x,
        RotationOrder::Xzy => y * z * x,
        RotationOrder::Yzx => x * z * y,
        RotationOrder::Yxz => z * x * y,
        RotationOrder::Zxy => y * x * z,
        RotationOrder::Zyx => x * y * z,
    }
}

/// Inverts a matrix, failing instead of returning garbage when it is not
/// invertible.
pub fn checked_inverse(matrix: DMat4) -> Result<DMat4, Error> {
    if matrix.determinant().abs() < SINGULAR_EPSILON {
        return Err(Error::SingularMatrix);
    }
    Ok(matrix.inverse())
}

/// The determinant of the rotational (upper-left 3x3) block. Negative values
/// indicate a mirroring transform.
pub fn rotation_determinant(matrix: DMat4) -> f64 {
    DMat3::from_mat4(matrix).determinant()
}

/// The matrix that transforms directions under `matrix`: the
/// inverse-transpose of the rotational block, with translation dropped.
pub fn normal_matrix(matrix: DMat4) -> Result<DMat3, Error> {
    let rotational = DMat3::from_mat4(matrix);
    if rotational.determinant().abs() < SINGULAR_EPSILON {
        return Err(Error::SingularMatrix);
    }
    Ok(rotational.inverse().transpose())
}
