// Affine transform helpers for scene geometry.
//
// Geoms store translation / rotation (degrees) / scale and cache the
// composed matrix alongside its inverse and inverse-transpose.

use glam::{Mat4, Vec3};

/// Compose translation, intrinsic XYZ rotation (degrees) and scale.
///
/// Order: `T * Rx * Ry * Rz * S`, so scale is applied first and
/// translation last.
pub fn compose_transform(translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Mat4::from_rotation_x(rotation_degrees.x.to_radians())
        * Mat4::from_rotation_y(rotation_degrees.y.to_radians())
        * Mat4::from_rotation_z(rotation_degrees.z.to_radians());
    Mat4::from_translation(translation) * rotation * Mat4::from_scale(scale)
}

/// Extension trait for Mat4 with the inverses the intersection stage needs.
pub trait Mat4Ext {
    /// Inverse-transpose, used to carry normals from object to world space.
    fn inverse_transpose(&self) -> Mat4;

    /// True when the matrix has no usable inverse.
    fn is_singular(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn inverse_transpose(&self) -> Mat4 {
        self.inverse().transpose()
    }

    fn is_singular(&self) -> bool {
        let det = self.determinant();
        !det.is_finite() || det.abs() < f32::EPSILON
    }
}
