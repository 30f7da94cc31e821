// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{compose_transform, Mat4Ext};

/// `1 / sqrt(3)`: a unit vector has at least one component below this magnitude.
pub const SQRT_OF_ONE_THIRD: f32 = 0.577_350_26;
