mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use orb_tracer::Camera;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene::{BuiltinScene, Scene, SceneFile};

/// Largest accepted image width or height, in pixels.
const MAX_IMAGE_SIDE: u32 = 16_384;

#[derive(Parser, Debug)]
#[command(name = "orb", version, about = "Render sphere scenes with a Monte Carlo ray tracer")]
struct Args {
    /// Scene description (JSON). When omitted the `--builtin` scene is used.
    scene: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    /// Built-in scene to render when no scene file is given
    builtin: BuiltinScene,

    #[arg(short, long, default_value = "image.ppm")]
    /// Output image. `.ppm` is written as plain text, other extensions
    /// (`.png`, ...) are encoded by their format
    output: PathBuf,

    #[arg(long)]
    /// Image width in pixels
    width: Option<u32>,

    #[arg(long)]
    /// Width over height
    aspect_ratio: Option<f32>,

    #[arg(long)]
    /// Samples per pixel
    spp: Option<u32>,

    #[arg(long)]
    /// Maximum scatter events per camera ray
    max_depth: Option<u32>,

    #[arg(long, default_value_t)]
    /// Seed for every random decision. The same seed, scene and settings
    /// always produce the same image.
    seed: u64,
}

impl Args {
    /// Command-line settings win over the scene's camera block.
    fn apply_overrides(&self, camera: &mut Camera) {
        if let Some(width) = self.width {
            camera.image_width = width;
        }
        if let Some(aspect_ratio) = self.aspect_ratio {
            camera.aspect_ratio = aspect_ratio;
        }
        if let Some(spp) = self.spp {
            camera.samples_per_pixel = spp;
        }
        if let Some(max_depth) = self.max_depth {
            camera.max_depth = max_depth;
        }
    }

    fn load_scene(&self) -> Result<Scene> {
        match &self.scene {
            Some(path) => {
                log::info!("loading scene {}", path.display());
                SceneFile::load(path)
                    .and_then(|file| file.build())
                    .with_context(|| format!("failed to load scene {}", path.display()))
            }
            None => {
                log::info!("using built-in scene {:?}", self.builtin);
                Ok(self.builtin.build())
            }
        }
    }
}

/// Reject image settings that cannot be rendered or would not fit in memory.
fn check_image_size(camera: &Camera) -> Result<()> {
    if camera.image_width == 0 {
        anyhow::bail!("image width must be at least 1 pixel");
    }
    if camera.image_width > MAX_IMAGE_SIDE {
        anyhow::bail!(
            "image width {} exceeds the limit of {} pixels",
            camera.image_width,
            MAX_IMAGE_SIDE
        );
    }
    if camera.aspect_ratio.is_nan() || camera.aspect_ratio <= 0.0 {
        anyhow::bail!("aspect ratio must be positive, got {}", camera.aspect_ratio);
    }

    let height = camera.computed_image_height();
    if height > MAX_IMAGE_SIDE {
        anyhow::bail!(
            "aspect ratio {} gives an image height of {} pixels, the limit is {}",
            camera.aspect_ratio,
            height,
            MAX_IMAGE_SIDE
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Scene { mut camera, world } = args.load_scene()?;
    args.apply_overrides(&mut camera);

    check_image_size(&camera)?;

    log::info!("seed {}", args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let image = camera.render(&world, &mut rng);

    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}
