//! Image buffer and file output.
//!
//! The tracer's native format is plain-text PPM ("P3"). Other extensions
//! are handed to the `image` crate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::renderer::color_to_rgb;
use crate::Color;

/// Errors that can occur while writing a rendered image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer does not match a {width}x{height} image")]
    BufferSize { width: u32, height: u32 },
}

/// Averaged linear colors for every pixel, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let idx = self.index(x, y);
        self.pixels[idx] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Gamma-encoded 8-bit RGB bytes, three per pixel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|color| color_to_rgb(*color))
            .collect()
    }

    /// Write the image as plain-text PPM: a `P3` header, the dimensions,
    /// the maximum value 255, then one `r g b` line per pixel.
    pub fn write_ppm<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.ppm_header().as_bytes())?;
        for color in &self.pixels {
            writer.write_all(ppm_pixel_line(*color).as_bytes())?;
        }
        Ok(())
    }

    /// The PPM encoding as a string.
    pub fn to_ppm_string(&self) -> String {
        let mut ppm = self.ppm_header();
        for color in &self.pixels {
            ppm.push_str(&ppm_pixel_line(*color));
        }
        ppm
    }

    fn ppm_header(&self) -> String {
        format!("P3\n{} {}\n255\n", self.width, self.height)
    }

    /// Write the image as plain-text PPM to `path`.
    pub fn write_ppm_file(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_ppm(&mut writer)?;
        writer.flush()?;
        log::info!("Saved {}x{} PPM to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Save to `path`, choosing the format from its extension.
    ///
    /// `.ppm` (or no extension) writes plain-text PPM; anything else is
    /// encoded by the `image` crate.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .map_or(true, |ext| ext.eq_ignore_ascii_case("ppm"));
        if is_ppm {
            return self.write_ppm_file(path);
        }

        let buffer = image::RgbImage::from_raw(self.width, self.height, self.to_rgb8()).ok_or(
            RenderError::BufferSize {
                width: self.width,
                height: self.height,
            },
        )?;
        buffer.save(path)?;
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

fn ppm_pixel_line(color: Color) -> String {
    let [r, g, b] = color_to_rgb(color);
    format!("{} {} {}\n", r, g, b)
}
