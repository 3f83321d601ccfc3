//! Scene descriptions for the `orb` command line.
//!
//! A scene file is JSON with three optional sections:
//!
//! ```json
//! {
//!   "camera": { "image_width": 400, "look_from": [-2, 2, 1], "vfov": 20 },
//!   "materials": {
//!     "ground": { "type": "lambertian", "albedo": [0.8, 0.8, 0.0] },
//!     "glass":  { "type": "dielectric", "refraction_index": 1.5 }
//!   },
//!   "spheres": [
//!     { "center": [0, -100.5, -1], "radius": 100, "material": "ground" }
//!   ]
//! }
//! ```
//!
//! Spheres refer to materials by name, so one material is shared by every
//! sphere that names it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use orb_tracer::{
    Background, Camera, Color, Dielectric, HittableList, Lambertian, Material, Metal, Point3,
    Sphere, Vec3,
};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sphere {index} references unknown material '{name}'")]
    UnknownMaterial { index: usize, name: String },

    #[error("Material '{name}' is invalid: {reason}")]
    InvalidMaterial { name: String, reason: String },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A ready-to-render scene.
pub struct Scene {
    pub camera: Camera,
    pub world: HittableList,
}

/// Camera block of a scene file. Missing keys keep the camera defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSettings {
    pub aspect_ratio: Option<f32>,
    pub image_width: Option<u32>,
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
    pub vfov: Option<f32>,
    pub look_from: Option<[f32; 3]>,
    pub look_at: Option<[f32; 3]>,
    pub vup: Option<[f32; 3]>,
    pub defocus_angle: Option<f32>,
    pub focus_dist: Option<f32>,
    pub background: Option<BackgroundSpec>,
}

impl CameraSettings {
    /// Overlay these settings on `camera`.
    pub fn apply(&self, mut camera: Camera) -> Camera {
        if let Some(aspect_ratio) = self.aspect_ratio {
            camera.aspect_ratio = aspect_ratio;
        }
        if let Some(image_width) = self.image_width {
            camera.image_width = image_width;
        }
        if let Some(samples) = self.samples_per_pixel {
            camera.samples_per_pixel = samples;
        }
        if let Some(max_depth) = self.max_depth {
            camera.max_depth = max_depth;
        }
        if let Some(vfov) = self.vfov {
            camera.vfov = vfov;
        }
        if let Some(look_from) = self.look_from {
            camera.look_from = Point3::from_array(look_from);
        }
        if let Some(look_at) = self.look_at {
            camera.look_at = Point3::from_array(look_at);
        }
        if let Some(vup) = self.vup {
            camera.vup = Vec3::from_array(vup);
        }
        if let Some(defocus_angle) = self.defocus_angle {
            camera.defocus_angle = defocus_angle;
        }
        if let Some(focus_dist) = self.focus_dist {
            camera.focus_dist = focus_dist;
        }
        if let Some(background) = &self.background {
            camera.background = background.to_background();
        }
        camera
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BackgroundSpec {
    Sky,
    Solid { color: [f32; 3] },
}

impl BackgroundSpec {
    fn to_background(&self) -> Background {
        match self {
            BackgroundSpec::Sky => Background::Sky,
            BackgroundSpec::Solid { color } => Background::Solid(Color::from_array(*color)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MaterialSpec {
    Lambertian {
        albedo: [f32; 3],
    },
    Metal {
        albedo: [f32; 3],
        #[serde(default)]
        fuzz: f32,
    },
    Dielectric {
        refraction_index: f32,
    },
}

impl MaterialSpec {
    fn build(&self, name: &str) -> SceneResult<Arc<dyn Material>> {
        let invalid = |reason: &str| SceneError::InvalidMaterial {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        match *self {
            MaterialSpec::Lambertian { albedo } => {
                let albedo = checked_albedo(albedo).ok_or_else(|| invalid("negative albedo"))?;
                Ok(Arc::new(Lambertian::new(albedo)))
            }
            MaterialSpec::Metal { albedo, fuzz } => {
                let albedo = checked_albedo(albedo).ok_or_else(|| invalid("negative albedo"))?;
                if !(0.0..=1.0).contains(&fuzz) {
                    log::warn!("Material '{}': fuzz {} clamped to [0, 1]", name, fuzz);
                }
                Ok(Arc::new(Metal::new(albedo, fuzz)))
            }
            MaterialSpec::Dielectric { refraction_index } => {
                if refraction_index.is_nan() || refraction_index <= 0.0 {
                    return Err(invalid("refraction_index must be positive"));
                }
                Ok(Arc::new(Dielectric::new(refraction_index)))
            }
        }
    }
}

fn checked_albedo(albedo: [f32; 3]) -> Option<Color> {
    let color = Color::from_array(albedo);
    (color.min_element() >= 0.0).then_some(color)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SphereSpec {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: String,
}

/// Parsed scene file, before materials are instantiated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialSpec>,
    #[serde(default)]
    pub spheres: Vec<SphereSpec>,
}

impl SceneFile {
    /// Read and parse a scene file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let scene = Self::from_json_str(&text)?;
        log::info!(
            "Loaded {} materials, {} spheres from {}",
            scene.materials.len(),
            scene.spheres.len(),
            path.display()
        );
        Ok(scene)
    }

    pub fn from_json_str(text: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Instantiate materials and geometry.
    pub fn build(&self) -> SceneResult<Scene> {
        let mut materials: BTreeMap<&str, Arc<dyn Material>> = BTreeMap::new();
        for (name, spec) in &self.materials {
            materials.insert(name.as_str(), spec.build(name)?);
        }

        let mut world = HittableList::new();
        for (index, sphere) in self.spheres.iter().enumerate() {
            let material = materials.get(sphere.material.as_str()).ok_or_else(|| {
                SceneError::UnknownMaterial {
                    index,
                    name: sphere.material.clone(),
                }
            })?;
            let sphere = Sphere::new(
                Point3::from_array(sphere.center),
                sphere.radius,
                Arc::clone(material),
            );
            if sphere.radius() <= 0.0 {
                log::warn!(
                    "Sphere {} at {} has radius {} and will never be hit",
                    index,
                    sphere.center(),
                    sphere.radius()
                );
            }
            world.add(sphere);
        }

        if world.is_empty() {
            log::warn!("Scene has no spheres, only the background will be visible");
        }

        Ok(Scene {
            camera: self.camera.apply(Camera::new()),
            world,
        })
    }
}

/// Scenes compiled into the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BuiltinScene {
    /// One diffuse sphere seen by the default camera
    #[default]
    Single,
    /// Ground, diffuse, metal and glass spheres with depth of field
    ThreeSpheres,
}

impl BuiltinScene {
    pub fn build(self) -> Scene {
        match self {
            BuiltinScene::Single => single_sphere(),
            BuiltinScene::ThreeSpheres => three_spheres(),
        }
    }
}

fn single_sphere() -> Scene {
    let mut world = HittableList::new();
    world.add(Sphere::new(
        Point3::new(10.0, 70.0, 80.0),
        5.0,
        Arc::new(Lambertian::new(Color::new(0.7, 0.7, 1.0))),
    ));

    Scene {
        camera: Camera::new(),
        world,
    }
}

fn three_spheres() -> Scene {
    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)));
    let center: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)));
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
    let bubble: Arc<dyn Material> = Arc::new(Dielectric::new(1.0 / 1.5));
    let metal: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 1.0));

    let mut world = HittableList::new();
    world.add(Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, ground));
    world.add(Sphere::new(Point3::new(0.0, 0.0, -1.2), 0.5, center));
    world.add(Sphere::new(Point3::new(-1.0, 0.0, -1.0), 0.5, glass));
    world.add(Sphere::new(Point3::new(-1.0, 0.0, -1.0), 0.4, bubble));
    world.add(Sphere::new(Point3::new(1.0, 0.0, -1.0), 0.5, metal));

    let camera = Camera::new()
        .with_resolution(400, 16.0 / 9.0)
        .with_quality(100, 50)
        .with_position(Point3::new(-2.0, 2.0, 1.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y)
        .with_lens(20.0, 10.0, 3.4);

    Scene { camera, world }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_tracer::{Hittable, Interval, Ray};

    const SHIPPED: &str = include_str!("../scenes/three_spheres.json");

    #[test]
    fn test_empty_document_is_default_scene() {
        let scene = SceneFile::from_json_str("{}").unwrap().build().unwrap();
        assert!(scene.world.is_empty());
        assert_eq!(scene.camera.image_width, 100);
        assert_eq!(scene.camera.look_from, Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_camera_block_overrides_defaults() {
        let text = r#"{
            "camera": {
                "image_width": 64,
                "aspect_ratio": 2.0,
                "look_from": [1, 2, 3],
                "defocus_angle": 0.5,
                "background": { "type": "solid", "color": [0.1, 0.2, 0.3] }
            }
        }"#;
        let camera = SceneFile::from_json_str(text).unwrap().build().unwrap().camera;

        assert_eq!(camera.image_width, 64);
        assert_eq!(camera.aspect_ratio, 2.0);
        assert_eq!(camera.look_from, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.defocus_angle, 0.5);
        assert_eq!(camera.samples_per_pixel, 10);
        assert_eq!(camera.background, Background::Solid(Color::new(0.1, 0.2, 0.3)));
    }

    #[test]
    fn test_spheres_share_named_materials() {
        let text = r#"{
            "materials": { "mirror": { "type": "metal", "albedo": [0.9, 0.9, 0.9] } },
            "spheres": [
                { "center": [0, 0, 5], "radius": 1, "material": "mirror" },
                { "center": [0, 0, 9], "radius": 1, "material": "mirror" }
            ]
        }"#;
        let scene = SceneFile::from_json_str(text).unwrap().build().unwrap();
        assert_eq!(scene.world.len(), 2);

        let ray = Ray::new(Point3::ZERO, Vec3::Z);
        let rec = scene
            .world
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("nearest sphere");
        assert!((rec.t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_sphere_is_kept_but_never_hit() {
        let text = r#"{
            "materials": { "grey": { "type": "lambertian", "albedo": [0.5, 0.5, 0.5] } },
            "spheres": [ { "center": [0, 0, 5], "radius": 0, "material": "grey" } ]
        }"#;
        let scene = SceneFile::from_json_str(text).unwrap().build().unwrap();
        assert_eq!(scene.world.len(), 1);

        let ray = Ray::new(Point3::ZERO, Vec3::Z);
        assert!(scene.world.hit(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_unknown_material_is_reported() {
        let text = r#"{ "spheres": [ { "center": [0, 0, 0], "radius": 1, "material": "gold" } ] }"#;
        let err = SceneFile::from_json_str(text).unwrap().build().err().unwrap();
        match err {
            SceneError::UnknownMaterial { index, name } => {
                assert_eq!(index, 0);
                assert_eq!(name, "gold");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_materials_are_rejected() {
        let glass = r#"{ "materials": { "bad": { "type": "dielectric", "refraction_index": 0 } } }"#;
        let err = SceneFile::from_json_str(glass).unwrap().build().err().unwrap();
        assert!(matches!(err, SceneError::InvalidMaterial { .. }));

        let paint = r#"{ "materials": { "bad": { "type": "lambertian", "albedo": [-1, 0, 0] } } }"#;
        let err = SceneFile::from_json_str(paint).unwrap().build().err().unwrap();
        assert!(err.to_string().contains("negative albedo"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SceneFile::from_json_str(r#"{ "spheres": [ { "radius": 1 } ] }"#).unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));

        let err = SceneFile::from_json_str(r#"{ "lights": [] }"#).unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }

    #[test]
    fn test_metal_fuzz_defaults_to_mirror() {
        let text = r#"{ "materials": { "m": { "type": "metal", "albedo": [1, 1, 1] } } }"#;
        let file = SceneFile::from_json_str(text).unwrap();
        match &file.materials["m"] {
            MaterialSpec::Metal { fuzz, .. } => assert_eq!(*fuzz, 0.0),
            other => panic!("unexpected material: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SceneFile::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn test_shipped_scene_matches_builtin() {
        let from_file = SceneFile::from_json_str(SHIPPED).unwrap().build().unwrap();
        let builtin = BuiltinScene::ThreeSpheres.build();

        assert_eq!(from_file.world.len(), builtin.world.len());
        assert_eq!(from_file.camera.image_width, builtin.camera.image_width);
        assert_eq!(from_file.camera.look_from, builtin.camera.look_from);
        assert_eq!(from_file.camera.defocus_angle, builtin.camera.defocus_angle);
        assert_eq!(from_file.camera.focus_dist, builtin.camera.focus_dist);
    }

    #[test]
    fn test_builtin_single_uses_default_camera() {
        let scene = BuiltinScene::Single.build();
        assert_eq!(scene.world.len(), 1);
        assert_eq!(scene.camera.image_width, 100);

        let ray = Ray::new(Point3::ZERO, Vec3::new(1.0, 7.0, 8.0));
        let rec = scene.world.hit(&ray, Interval::new(0.001, f32::INFINITY));
        assert!(rec.is_some_and(|rec| rec.front_face));
    }
}
