//! Conversions between the host's Z-up frame and the runtime's Y-up frame.
//!
//! Z-up `(x, y, z)` is Y-up `(x, z, -y)`. The matrices are exact
//! permutations so round trips do not drift.

use glam::{Mat4, Vec3, Vec4};

/// Rotates Z-up coordinates into Y-up.
pub const Z_UP_TO_Y_UP: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, -1.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

/// Rotates Y-up coordinates into Z-up.
pub const Y_UP_TO_Z_UP: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

pub fn point_to_y_up(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

pub fn point_to_z_up(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.z, v.y)
}

/// Re-expresses a Z-up transform so it acts on Y-up coordinates.
pub fn matrix_to_y_up(m: Mat4) -> Mat4 {
    Z_UP_TO_Y_UP * m * Y_UP_TO_Z_UP
}

pub fn matrix_to_z_up(m: Mat4) -> Mat4 {
    Y_UP_TO_Z_UP * m * Z_UP_TO_Y_UP
}
