//! Orb tracer - CPU Monte Carlo ray tracing of sphere scenes.
//!
//! A camera casts jittered rays through every pixel, spheres report their
//! nearest intersection, and Lambertian, metal, or dielectric materials
//! scatter the ray until it escapes to the background or runs out of depth.
//!
//! Rendering is single-threaded and every random decision is drawn from a
//! caller-provided generator, so a seeded generator reproduces an image
//! byte for byte.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use orb_tracer::{Camera, Color, Lambertian, Sphere, Vec3};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let world = Sphere::new(
//!     Vec3::new(10.0, 70.0, 80.0),
//!     5.0,
//!     Arc::new(Lambertian::new(Color::new(0.7, 0.7, 1.0))),
//! );
//! let mut camera = Camera::new();
//! let mut rng = StdRng::seed_from_u64(42);
//! camera.render_to_path(&world, "image.ppm", &mut rng)?;
//! # Ok::<(), orb_tracer::RenderError>(())
//! ```

mod camera;
mod hittable;
mod material;
mod output;
mod renderer;
pub mod sampling;
mod sphere;

pub use camera::Camera;
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    reflect, reflectance, refract, Dielectric, Lambertian, Material, Metal, ScatterResult,
};
pub use output::{ImageBuffer, RenderError};
pub use renderer::{
    color_to_rgb, linear_to_gamma, ray_color, render, render_pixel, sky_gradient, Background,
};
pub use sphere::Sphere;

/// Re-export the shared math types from orb_math
pub use orb_math::{Color, Interval, Point3, Ray, Vec3};
