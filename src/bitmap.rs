//! Decoded raster images handed between resolvers and sinks.
//!
//! Pixels are always RGBA8. Writing always goes through PNG so exported
//! bitmaps are lossless regardless of how the source drawable was stored.

use anyhow::{Context, Result, anyhow};
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap a raw RGBA8 buffer, checking that it matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(anyhow!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode any raster format the `image` crate understands.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).context("decoding raster drawable")?;
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))
    }

    /// Resample to exactly `width` x `height`.
    pub fn scaled(&self, width: u32, height: u32) -> Result<Self> {
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }
        let source = self.to_image()?;
        let resized = image::imageops::resize(&source, width, height, FilterType::Lanczos3);
        Ok(Self::from_image(resized))
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut png_data = Vec::new();
        let mut cursor = Cursor::new(&mut png_data);
        self.to_image()?
            .write_to(&mut cursor, ImageFormat::Png)
            .context("encoding PNG")?;
        Ok(png_data)
    }
}
