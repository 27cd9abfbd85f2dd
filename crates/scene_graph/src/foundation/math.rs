//! Math utilities and types
//!
//! Provides the vector, matrix and quaternion aliases used by the scene graph,
//! plus the TRS compose/decompose pair that every local matrix goes through.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion, Rotation3,
    Unit, UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type (column-major storage)
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in parent space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors (may be non-uniform or negative)
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from its three components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        compose(&self.position, &self.rotation, &self.scale)
    }

    /// Create a transform from a transformation matrix
    ///
    /// The matrix is assumed to be an affine TRS matrix without shear. A
    /// negative determinant is folded into the X scale so that mirrored
    /// transforms survive a compose/decompose round trip.
    pub fn from_matrix(matrix: Mat4) -> Self {
        // Extract position
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        // Extract scale from the matrix columns
        let mut scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();

        let linear: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        if linear.determinant() < 0.0 {
            scale_x = -scale_x;
        }
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // Extract rotation by removing scale from the basis vectors.
        // Zero scale yields NaN here; that is propagated, not guarded.
        let basis = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Compose a TRS matrix in the fixed translate * rotate * scale order
pub fn compose(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Rotation quaternion extracted from the upper 3x3 of a matrix
///
/// The upper 3x3 must be a pure (unscaled) rotation.
pub fn rotation_from_matrix(matrix: &Mat4) -> Quat {
    let basis: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

/// Build the rotation whose -Z axis looks from `eye` toward `target`
///
/// Mirrors the camera convention: right = forward x up, and the basis columns
/// are (right, up, -forward). When `eye` and `target` coincide the basis
/// degenerates; a parallel `up` is nudged off-axis first.
pub fn look_rotation(eye: &Vec3, target: &Vec3, up: &Vec3) -> Quat {
    let mut z_axis = eye - target;
    if z_axis.magnitude_squared() == 0.0 {
        z_axis.z = 1.0;
    }
    z_axis.normalize_mut();

    let mut x_axis = up.cross(&z_axis);
    if x_axis.magnitude_squared() == 0.0 {
        // up and z are parallel
        if up.z.abs() == 1.0 {
            z_axis.x += 0.0001;
        } else {
            z_axis.z += 0.0001;
        }
        z_axis.normalize_mut();
        x_axis = up.cross(&z_axis);
    }
    x_axis.normalize_mut();
    let y_axis = z_axis.cross(&x_axis);

    let basis = Mat3::from_columns(&[x_axis, y_axis, z_axis]);
    Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn same_rotation(a: &Quat, b: &Quat) -> bool {
        // q and -q encode the same rotation
        a.coords.dot(&b.coords).abs() > 0.9999
    }

    #[test]
    fn test_compose_order_is_trs() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI);
        let scale = Vec3::new(2.0, 1.0, 1.0);

        let matrix = compose(&position, &rotation, &scale);
        let moved = matrix.transform_point(&Point3::new(1.0, 0.0, 0.0));

        // scale x by 2, rotate onto +y, then translate
        assert_relative_eq!(moved.coords, Vec3::new(1.0, 4.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_compose_round_trip() {
        let cases = [
            Transform::new(
                Vec3::new(1.0, 2.0, 3.0),
                Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
                Vec3::new(2.0, 1.5, 0.8),
            ),
            Transform::new(
                Vec3::new(-4.0, 0.0, 10.0),
                Quat::from_euler_angles(0.3, -1.2, 2.0),
                Vec3::new(0.1, 3.0, 7.0),
            ),
            Transform::identity(),
        ];

        for original in cases {
            let decomposed = Transform::from_matrix(original.to_matrix());
            assert_relative_eq!(decomposed.position, original.position, epsilon = 1e-5);
            assert_relative_eq!(decomposed.scale, original.scale, epsilon = 1e-4);
            assert!(same_rotation(&decomposed.rotation, &original.rotation));
        }
    }

    #[test]
    fn test_decompose_reflection_keeps_matrix() {
        let mirrored = Transform::new(
            Vec3::new(0.5, 0.0, -1.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(-1.0, 2.0, 1.0),
        );
        let matrix = mirrored.to_matrix();
        let decomposed = Transform::from_matrix(matrix);

        assert!(decomposed.scale.x < 0.0);
        assert_relative_eq!(decomposed.to_matrix(), matrix, epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_zero_scale_is_not_guarded() {
        let flat = compose(&Vec3::zeros(), &Quat::identity(), &Vec3::new(0.0, 1.0, 1.0));
        let decomposed = Transform::from_matrix(flat);

        assert_eq!(decomposed.scale.x, 0.0);
        assert!(decomposed.rotation.coords.iter().any(|c| c.is_nan()));
    }

    #[test]
    fn test_look_rotation_points_minus_z_at_target() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let target = Vec3::zeros();
        let rotation = look_rotation(&eye, &target, &Vec3::y());

        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(forward, (target - eye).normalize(), epsilon = 1e-5);
    }
}
