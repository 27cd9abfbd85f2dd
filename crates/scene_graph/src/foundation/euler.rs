//! Euler angle rotations
//!
//! Intrinsic rotations applied in a configurable axis order. The order names
//! the matrix product: `XYZ` means `Rx * Ry * Rz`.

use super::math::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis order for composing an [`Euler`] rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EulerOrder {
    /// `Rx * Ry * Rz`
    #[default]
    XYZ,
    /// `Ry * Rx * Rz`
    YXZ,
    /// `Rz * Rx * Ry`
    ZXY,
    /// `Rz * Ry * Rx`
    ZYX,
    /// `Ry * Rz * Rx`
    YZX,
    /// `Rx * Rz * Ry`
    XZY,
}

impl EulerOrder {
    fn axes(self) -> [usize; 3] {
        match self {
            Self::XYZ => [0, 1, 2],
            Self::YXZ => [1, 0, 2],
            Self::ZXY => [2, 0, 1],
            Self::ZYX => [2, 1, 0],
            Self::YZX => [1, 2, 0],
            Self::XZY => [0, 2, 1],
        }
    }
}

/// Rotation angles in radians around X, Y and Z
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    /// Angle around X
    pub x: f32,
    /// Angle around Y
    pub y: f32,
    /// Angle around Z
    pub z: f32,
    /// Composition order
    pub order: EulerOrder,
}

impl Euler {
    /// Create an Euler rotation
    pub fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Convert to a unit quaternion
    pub fn to_quaternion(&self) -> Quat {
        let angles = [self.x, self.y, self.z];
        let axes = [Vec3::x_axis(), Vec3::y_axis(), Vec3::z_axis()];

        self.order
            .axes()
            .iter()
            .fold(Quat::identity(), |acc, &axis| {
                acc * Quat::from_axis_angle(&axes[axis], angles[axis])
            })
    }

    /// Extract angles from a pure rotation matrix
    pub fn from_rotation_matrix(m: &Mat3, order: EulerOrder) -> Self {
        const GIMBAL: f32 = 0.999_999_9;
        let clamp = |v: f32| v.clamp(-1.0, 1.0);

        let (x, y, z) = match order {
            EulerOrder::XYZ => {
                let y = clamp(m.m13).asin();
                if m.m13.abs() < GIMBAL {
                    ((-m.m23).atan2(m.m33), y, (-m.m12).atan2(m.m11))
                } else {
                    (m.m32.atan2(m.m22), y, 0.0)
                }
            }
            EulerOrder::YXZ => {
                let x = (-clamp(m.m23)).asin();
                if m.m23.abs() < GIMBAL {
                    (x, m.m13.atan2(m.m33), m.m21.atan2(m.m22))
                } else {
                    (x, (-m.m31).atan2(m.m11), 0.0)
                }
            }
            EulerOrder::ZXY => {
                let x = clamp(m.m32).asin();
                if m.m32.abs() < GIMBAL {
                    (x, (-m.m31).atan2(m.m33), (-m.m12).atan2(m.m22))
                } else {
                    (x, 0.0, m.m21.atan2(m.m11))
                }
            }
            EulerOrder::ZYX => {
                let y = (-clamp(m.m31)).asin();
                if m.m31.abs() < GIMBAL {
                    (m.m32.atan2(m.m33), y, m.m21.atan2(m.m11))
                } else {
                    (0.0, y, (-m.m12).atan2(m.m22))
                }
            }
            EulerOrder::YZX => {
                let z = clamp(m.m21).asin();
                if m.m21.abs() < GIMBAL {
                    ((-m.m23).atan2(m.m22), (-m.m31).atan2(m.m11), z)
                } else {
                    (0.0, m.m13.atan2(m.m33), z)
                }
            }
            EulerOrder::XZY => {
                let z = (-clamp(m.m12)).asin();
                if m.m12.abs() < GIMBAL {
                    (m.m32.atan2(m.m22), m.m13.atan2(m.m11), z)
                } else {
                    ((-m.m23).atan2(m.m33), 0.0, z)
                }
            }
        };

        Self { x, y, z, order }
    }

    /// Extract angles from a unit quaternion
    pub fn from_quaternion(q: &Quat, order: EulerOrder) -> Self {
        Self::from_rotation_matrix(q.to_rotation_matrix().matrix(), order)
    }
}
