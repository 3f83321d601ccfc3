//! Core path tracing integrator.
//!
//! Implements Monte Carlo path tracing with:
//! - Bounded scattering depth
//! - Gamma correction
//! - Anti-aliasing via multi-sampling
//!
//! Everything runs on the calling thread and consumes the generator in
//! strict pixel order, so a seeded stream reproduces an image exactly.

use std::time::Instant;

use orb_math::{Interval, Ray};
use rand::RngCore;

use crate::{Camera, Color, Hittable, ImageBuffer};

/// Closest accepted hit distance; skips self-intersection at the origin.
const SHADOW_ACNE_EPSILON: f32 = 0.001;

/// Radiance for rays that leave the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Background {
    /// Vertical white to sky-blue gradient
    #[default]
    Sky,
    /// Uniform color
    Solid(Color),
}

impl Background {
    /// Radiance seen along an escaping ray.
    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Sky => sky_gradient(ray),
            Background::Solid(color) => *color,
        }
    }
}

/// Compute the color seen by a ray.
///
/// Each hit multiplies the running throughput by the material attenuation
/// and continues along the scattered ray, which is the recursive definition
/// `attenuation * ray_color(scattered, depth - 1)` unrolled. Returns black
/// once `depth` scatter events are used up or a material absorbs the ray.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    background: &Background,
    rng: &mut dyn RngCore,
) -> Color {
    let mut throughput = Color::ONE;
    let mut current = *ray;

    for _ in 0..depth {
        let Some(rec) = world.hit(&current, Interval::new(SHADOW_ACNE_EPSILON, f32::INFINITY))
        else {
            return throughput * background.color(&current);
        };

        match rec.material.scatter(&current, &rec, rng) {
            Some(result) => {
                throughput *= result.attenuation;
                current = result.scattered;
            }
            None => return Color::ZERO,
        }
    }

    // Energy exhausted
    Color::ZERO
}

/// Compute sky gradient background.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    (1.0 - a) * white + a * blue
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit gamma-encoded RGB.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let intensity = Interval::new(0.000, 0.999);
    let quantize = |c: f32| (256.0 * intensity.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Render a single pixel with multi-sampling.
///
/// Returns the averaged linear color.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, camera.max_depth, &camera.background, rng);
    }

    pixel_color * camera.samples_scale()
}

/// Render the entire scene to an image buffer.
///
/// `camera` must already be initialized; [`Camera::render`] takes care of
/// that.
pub fn render(camera: &Camera, world: &dyn Hittable, rng: &mut dyn RngCore) -> ImageBuffer {
    let width = camera.image_width;
    let height = camera.image_height();
    let mut image = ImageBuffer::new(width, height);

    log::info!(
        "Rendering {}x{} @ {} spp, max depth {}",
        width,
        height,
        camera.samples_per_pixel,
        camera.max_depth
    );
    let start = Instant::now();

    for y in 0..height {
        log::debug!("Scanlines remaining: {}", height - y);
        for x in 0..width {
            let color = render_pixel(camera, world, x, y, rng);
            image.set(x, y, color);
        }
    }

    log::info!("Rendered in {:?}", start.elapsed());
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dielectric, HittableList, Lambertian, Material, Metal, Sphere};
    use orb_math::{Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn single_sphere_world() -> Sphere {
        Sphere::new(
            Point3::new(10.0, 70.0, 80.0),
            5.0,
            Arc::new(Lambertian::new(Color::new(0.7, 0.7, 1.0))),
        )
    }

    fn busy_world() -> HittableList {
        let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)));
        let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
        let mut world = HittableList::new();
        world.add(Sphere::new(Point3::new(0.0, -100.5, 1.0), 100.0, ground));
        let bubble: Arc<dyn Material> = Arc::new(Dielectric::new(1.0 / 1.5));
        world.add(Sphere::new(Point3::new(0.0, 0.0, 1.0), 0.5, glass));
        world.add(Sphere::new(Point3::new(0.0, 0.0, 1.0), 0.4, bubble));
        world.add(Sphere::new(
            Point3::new(1.0, 0.0, 1.0),
            0.5,
            Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 0.2)),
        ));
        world
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::Y));
        let down = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::NEG_Y));
        let level = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0)));

        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((down - Color::ONE).length() < 1e-6);
        assert!((level - Color::new(0.75, 0.85, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_sky_gradient_ignores_direction_length() {
        let short = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)));
        let long = sky_gradient(&Ray::new(Vec3::ONE, Vec3::new(10.0, 20.0, 30.0)));
        assert!((short - long).length() < 1e-6);
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-0.5), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgb_clamps_and_scales() {
        assert_eq!(color_to_rgb(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb(Color::splat(4.0)), [255, 255, 255]);
        assert_eq!(color_to_rgb(Color::new(0.25, -1.0, 1.0)), [128, 0, 255]);
    }

    #[test]
    fn test_zero_depth_is_black() {
        let world = busy_world();
        let mut rng = StdRng::seed_from_u64(42);
        let rays = [
            Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, 1.0)),
            Ray::new(Point3::ZERO, Vec3::Y),
        ];

        for ray in rays {
            let color = ray_color(&ray, &world, 0, &Background::Sky, &mut rng);
            assert_eq!(color, Color::ZERO);
        }
    }

    #[test]
    fn test_miss_returns_background() {
        let world = HittableList::new();
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.3, -0.2, 1.0));

        let sky = ray_color(&ray, &world, 10, &Background::Sky, &mut rng);
        assert_eq!(sky, sky_gradient(&ray));

        let solid = Background::Solid(Color::new(0.1, 0.2, 0.3));
        assert_eq!(
            ray_color(&ray, &world, 10, &solid, &mut rng),
            Color::new(0.1, 0.2, 0.3)
        );
    }

    #[test]
    fn test_depth_one_on_hit_is_black() {
        // The first scatter uses up the only bounce
        let world = single_sphere_world();
        let ray = Ray::new(Point3::ZERO, Vec3::new(1.0, 7.0, 8.0));
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(ray_color(&ray, &world, 1, &Background::Sky, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_absorbed_ray_is_black() {
        struct Absorber;
        impl Material for Absorber {
            fn scatter(
                &self,
                _ray_in: &Ray,
                _rec: &crate::HitRecord,
                _rng: &mut dyn RngCore,
            ) -> Option<crate::ScatterResult> {
                None
            }
        }

        let world = Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0, Arc::new(Absorber));
        let ray = Ray::new(Point3::ZERO, Vec3::Z);
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(ray_color(&ray, &world, 10, &Background::Sky, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_radiance_stays_in_unit_range() {
        let world = busy_world();
        let mut rng = StdRng::seed_from_u64(8);

        for i in 0..200 {
            let angle = i as f32 * 0.03;
            let ray = Ray::new(Point3::ZERO, Vec3::new(angle.sin(), -0.1, angle.cos()));
            let color = ray_color(&ray, &world, 10, &Background::Sky, &mut rng);
            assert!(color.min_element() >= 0.0);
            assert!(color.max_element() <= 1.0 + 1e-5, "color={color}");
        }
    }

    #[test]
    fn test_render_is_reproducible_for_a_seed() {
        let world = busy_world();
        let mut camera = Camera::new()
            .with_resolution(12, 1.5)
            .with_quality(3, 6)
            .with_position(Point3::new(0.0, 0.5, -1.0), Point3::new(0.0, 0.0, 1.0), Vec3::Y)
            .with_lens(60.0, 2.0, 2.0);

        let first = camera.render(&world, &mut StdRng::seed_from_u64(144));
        let second = camera.render(&world, &mut StdRng::seed_from_u64(144));
        let other = camera.render(&world, &mut StdRng::seed_from_u64(145));

        assert_eq!(first.to_ppm_string(), second.to_ppm_string());
        assert_eq!(first.pixels, second.pixels);
        assert_ne!(first.pixels, other.pixels);
    }

    #[test]
    fn test_single_sphere_render_shows_the_sphere() {
        let world = single_sphere_world();
        let mut camera = Camera::new();
        let image = camera.render(&world, &mut StdRng::seed_from_u64(42));
        assert_eq!((image.width, image.height), (100, 100));

        // The sphere projects to roughly pixel (43, 6); every sample there
        // hits it and picks up the 0.7 albedo, while the sky in the same row
        // keeps a green channel of at least 0.7
        let on_sphere = color_to_rgb(image.get(43, 6));
        let sky = color_to_rgb(image.get(10, 6));
        assert!(on_sphere[1] < sky[1], "sphere={on_sphere:?} sky={sky:?}");
        assert_eq!(sky[2], 255);
        assert_eq!(on_sphere[2], 255);

        // Far from the sphere only the gradient is visible
        let corner = image.get(99, 99);
        assert!((corner.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_single_sphere_render_reference_bytes() {
        // Pinned output of the default camera at seed 42. Any change to the
        // order or number of random draws shifts the sphere pixels.
        let world = single_sphere_world();
        let mut camera = Camera::new();
        let image = camera.render(&world, &mut StdRng::seed_from_u64(42));

        let expected = [
            ((0, 0), [199, 223, 255]),
            ((41, 5), [186, 197, 255]),
            ((42, 8), [204, 208, 255]),
            ((43, 6), [200, 206, 255]),
            ((44, 9), [202, 207, 255]),
            ((46, 6), [192, 207, 255]),
            ((50, 50), [222, 236, 255]),
        ];
        for ((x, y), rgb) in expected {
            assert_eq!(color_to_rgb(image.get(x, y)), rgb, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_render_pixel_averages_samples() {
        let world = HittableList::new();
        let mut camera = Camera::new()
            .with_quality(4, 3)
            .with_background(Background::Solid(Color::new(0.2, 0.4, 0.6)));
        camera.initialize();

        let mut rng = StdRng::seed_from_u64(1);
        let color = render_pixel(&camera, &world, 3, 3, &mut rng);
        assert!((color - Color::new(0.2, 0.4, 0.6)).length() < 1e-6);
    }
}
