// Re-export glam so downstream crates share one vector type
pub use glam::*;

mod interval;
mod ray;

pub use interval::Interval;
pub use ray::Ray;

/// A point in world space.
pub type Point3 = Vec3;

/// Linear RGB color, one channel per component.
pub type Color = Vec3;
