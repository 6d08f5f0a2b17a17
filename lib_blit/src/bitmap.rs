use std::path::Path;

use log::{debug, error};
use thiserror::Error;

use crate::palette::Colour;

#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("Invalid pixel data length: expected {expected} bytes for {width}x{height}, got {actual}")]
    InvalidPixelDataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to read image file")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image")]
    Image(#[from] image::ImageError),
}

/// A true-colour source image in row-major RGBA order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBitmap {
    width: u32,
    height: u32,
    rgba_data: Vec<u8>,
}

impl RgbaBitmap {
    pub fn new(width: u32, height: u32, rgba_data: Vec<u8>) -> Result<Self, BitmapError> {
        let expected = width as usize * height as usize * 4;
        if rgba_data.len() != expected {
            error!(
                "Pixel data for {}x{} should be {} bytes, got {}",
                width,
                height,
                expected,
                rgba_data.len()
            );
            return Err(BitmapError::InvalidPixelDataLength {
                width,
                height,
                expected,
                actual: rgba_data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba_data,
        })
    }

    /// Builds a bitmap from one colour per pixel.
    pub fn from_colours(width: u32, height: u32, colours: &[Colour]) -> Result<Self, BitmapError> {
        let rgba_data = colours.iter().flat_map(|c| c.to_bytes()).collect();
        Self::new(width, height, rgba_data)
    }

    /// A bitmap filled with a single colour.
    pub fn solid(width: u32, height: u32, colour: Colour) -> Self {
        let rgba_data = colour.to_bytes().repeat(width as usize * height as usize);
        Self {
            width,
            height,
            rgba_data,
        }
    }

    /// Decodes any image format the `image` crate recognises.
    pub fn from_encoded(data: &[u8]) -> Result<Self, BitmapError> {
        let image = image::load_from_memory(data)?.to_rgba8();
        debug!("Decoded {}x{} bitmap", image.width(), image.height());
        Ok(Self::from(image))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BitmapError> {
        let path = path.as_ref();
        debug!("Loading bitmap {}", path.display());
        let data = std::fs::read(path)?;
        Self::from_encoded(&data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Pixels in row-major order: top to bottom, left to right.
    pub fn pixels(&self) -> impl Iterator<Item = Colour> + '_ {
        self.rgba_data
            .chunks_exact(4)
            .map(|p| Colour::new(p[0], p[1], p[2], p[3]))
    }
}

impl From<image::RgbaImage> for RgbaBitmap {
    fn from(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            rgba_data: image.into_raw(),
        }
    }
}
