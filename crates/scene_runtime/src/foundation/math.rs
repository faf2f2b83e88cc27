//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene runtime. Matrices are
//! column-vector convention (`M * v`), quaternions are scalar-first internally.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
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

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix without shear into translation, rotation and scale
    pub fn from_matrix(matrix: Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // A zero-length axis carries no orientation; fall back to identity
        if scale_x == 0.0 || scale_y == 0.0 || scale_z == 0.0 {
            return Self {
                position,
                rotation: Quat::identity(),
                scale,
            };
        }

        #[rustfmt::skip]
        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Build a unit quaternion from `[x, y, z, w]` storage order.
///
/// Degenerate (zero-length or non-finite) input yields the identity rotation.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    let raw = Quaternion::new(w, x, y, z);
    let norm = raw.norm();
    if norm.is_finite() && norm > f32::EPSILON {
        Quat::from_quaternion(raw)
    } else {
        Quat::identity()
    }
}

/// Math utility functions
pub mod utils {
    /// Reciprocal that maps zero to zero instead of infinity
    pub fn safe_recip(value: f32) -> f32 {
        if value == 0.0 { 0.0 } else { 1.0 / value }
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a perspective projection matrix
    ///
    /// Right-handed view space looking down -Z, depth mapped to [0, 1].
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [f/a  0   0            0          ]
        //     [0    f   0            0          ]
        //     [0    0   far/(n-f)    n*far/(n-f)]
        //     [0    0  -1            0          ]
        let focal = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = focal / aspect;
        result[(1, 1)] = focal;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = (near * far) / (near - far);
        result[(3, 2)] = -1.0;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_matrix_round_trip() {
        let transform = Transform {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::new(2.0, 0.5, 1.5),
        };

        let decomposed = Transform::from_matrix(transform.to_matrix());

        assert_relative_eq!(decomposed.position, transform.position, epsilon = EPSILON);
        assert_relative_eq!(decomposed.scale, transform.scale, epsilon = EPSILON);
        assert_relative_eq!(decomposed.rotation, transform.rotation, epsilon = EPSILON);
    }

    #[test]
    fn test_quat_from_xyzw_is_scalar_first() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let q = quat_from_xyzw(0.0, half, 0.0, half);
        let expected = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(q, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_quat_from_zero_is_identity() {
        assert_eq!(quat_from_xyzw(0.0, 0.0, 0.0, 0.0), Quat::identity());
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let projection = Mat4::perspective(1.0, 1.5, 0.1, 100.0);

        let near = projection * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = projection * Vec4::new(0.0, 0.0, -100.0, 1.0);

        assert_relative_eq!(near.z / near.w, 0.0, epsilon = EPSILON);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = EPSILON);
    }
}
