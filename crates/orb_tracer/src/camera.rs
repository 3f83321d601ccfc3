//! Camera for ray generation.

use std::path::Path;

use orb_math::{Point3, Ray, Vec3};
use rand::RngCore;

use crate::renderer::{self, Background};
use crate::sampling::{random_in_unit_disk, sample_square};
use crate::{Color, Hittable, ImageBuffer, RenderError};

/// Perspective camera with an optional thin-lens defocus disk.
///
/// The public fields are plain configuration. Derived viewport state is
/// computed by [`Camera::initialize`], which must run after the last
/// configuration change and before any ray is generated. [`Camera::render`]
/// calls it itself.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    pub image_width: u32,
    pub samples_per_pixel: u32,
    /// Maximum number of scatter events per camera ray
    pub max_depth: u32,

    // Camera positioning
    pub look_from: Point3,
    pub look_at: Point3,
    /// Camera-relative "up" direction
    pub vup: Vec3,

    // Lens settings
    pub vfov: f32,          // Vertical field of view in degrees
    pub defocus_angle: f32, // Variation angle of rays through each pixel
    pub focus_dist: f32,    // Distance from camera to plane of perfect focus

    /// Radiance returned by rays that escape the scene
    pub background: Background,

    // Cached computed values (set by initialize())
    initialized: bool,
    image_height: u32,
    center: Point3,
    pixel00_loc: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    samples_scale: f32,
}

impl Camera {
    /// Create a camera with the default configuration: a 100x100 image,
    /// 10 samples, depth 10, 90 degree field of view, looking from
    /// (0, 0, -1) at the origin with a pinhole lens focused at 10.
    pub fn new() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 100,
            samples_per_pixel: 10,
            max_depth: 10,
            look_from: Point3::new(0.0, 0.0, -1.0),
            look_at: Point3::ZERO,
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            background: Background::default(),
            initialized: false,
            image_height: 0,
            center: Point3::ZERO,
            pixel00_loc: Point3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
            samples_scale: 0.0,
        }
    }

    /// Set image width and aspect ratio. The height is derived.
    pub fn with_resolution(mut self, image_width: u32, aspect_ratio: f32) -> Self {
        self.image_width = image_width;
        self.aspect_ratio = aspect_ratio;
        self.initialized = false;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples;
        self.max_depth = max_depth;
        self.initialized = false;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Point3, look_at: Point3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialized = false;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialized = false;
        self
    }

    /// Set background radiance.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Derive the viewport from the current configuration.
    ///
    /// Idempotent and draws no random numbers.
    pub fn initialize(&mut self) {
        self.image_height = self.computed_image_height();

        self.samples_scale = if self.samples_per_pixel > 0 {
            1.0 / self.samples_per_pixel as f32
        } else {
            log::warn!("samples_per_pixel is 0, every pixel will be black");
            0.0
        };

        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width =
            viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;

        if !self.pixel00_loc.is_finite() {
            log::warn!(
                "camera basis is degenerate (look_from={}, look_at={}, vup={})",
                self.look_from,
                self.look_at,
                self.vup
            );
        }

        self.initialized = true;
    }

    /// Generate a ray through a random point of pixel (i, j).
    ///
    /// Draws two numbers for the sub-pixel offset, then (with a nonzero
    /// defocus angle) rejection samples the defocus disk.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        debug_assert!(self.initialized, "Camera::initialize must run before get_ray");

        let offset = sample_square(rng);
        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// World-space offset to a random point in the square surrounding a
    /// pixel center.
    pub fn pixel_sample_square(&self, rng: &mut dyn RngCore) -> Vec3 {
        let offset = sample_square(rng);
        offset.x * self.pixel_delta_u + offset.y * self.pixel_delta_v
    }

    /// World-space offset to a random point in a disk of `radius` pixels
    /// around a pixel center.
    pub fn pixel_sample_disk(&self, radius: f32, rng: &mut dyn RngCore) -> Vec3 {
        let p = radius * random_in_unit_disk(rng);
        p.x * self.pixel_delta_u + p.y * self.pixel_delta_v
    }

    /// Sample a ray origin on the defocus disk.
    pub fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Point3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    /// Radiance carried back along `ray` from `world`.
    pub fn ray_color(
        &self,
        ray: &Ray,
        depth: u32,
        world: &dyn Hittable,
        rng: &mut dyn RngCore,
    ) -> Color {
        renderer::ray_color(ray, world, depth, &self.background, rng)
    }

    /// Initialize, then trace every pixel of `world`.
    pub fn render(&mut self, world: &dyn Hittable, rng: &mut dyn RngCore) -> ImageBuffer {
        self.initialize();
        renderer::render(self, world, rng)
    }

    /// Render `world` and write the result to `path` as a plain PPM.
    pub fn render_to_path(
        &mut self,
        world: &dyn Hittable,
        path: impl AsRef<Path>,
        rng: &mut dyn RngCore,
    ) -> Result<(), RenderError> {
        let image = self.render(world, rng);
        image.write_ppm_file(path)
    }

    /// Height implied by the current width and aspect ratio, at least 1.
    ///
    /// Saturates at `u32::MAX` for vanishing aspect ratios.
    pub fn computed_image_height(&self) -> u32 {
        ((self.image_width as f32 / self.aspect_ratio) as u32).max(1)
    }

    /// Derived image height. Valid after [`Camera::initialize`].
    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get the samples scale factor (1 / samples_per_pixel).
    pub fn samples_scale(&self) -> f32 {
        self.samples_scale
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Orthonormal camera frame `(u, v, w)`; `w` points away from the view.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn pixel00_loc(&self) -> Point3 {
        self.pixel00_loc
    }

    pub fn pixel_deltas(&self) -> (Vec3, Vec3) {
        (self.pixel_delta_u, self.pixel_delta_v)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
