use log::{debug, error, info};
use thiserror::Error;

use crate::bitmap::RgbaBitmap;
use crate::palette::{Palette, PaletteError, Rgb};

#[derive(Error, Debug)]
pub enum QuantizeError {
    #[error("Strict quantization needs a palette, but the palette is empty")]
    EmptyPalette,
    #[error("Image {width}x{height} is too large, sprites are limited to 65535x65535")]
    TooLarge { width: u32, height: u32 },
    #[error("Palette lookup failed at pixel ({x}, {y})")]
    Palette {
        x: u32,
        y: u32,
        #[source]
        source: PaletteError,
    },
}

/// A bitmap reduced to palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage<'p> {
    pub width: u16,
    pub height: u16,
    pub palette: &'p Palette,
    /// One index per pixel, row-major.
    pub indices: Vec<u8>,
}

/// Maps every pixel of `bitmap` onto `palette`, top to bottom and left to
/// right.
///
/// In non-strict mode unseen colours are appended in the order they are met,
/// so the scan order decides the final palette layout. Pixels matching
/// `transparent` have their alpha forced to zero before lookup.
pub fn quantize<'p>(
    bitmap: &RgbaBitmap,
    palette: &'p mut Palette,
    transparent: Option<Rgb>,
    strict: bool,
) -> Result<QuantizedImage<'p>, QuantizeError> {
    let (width, height) = bitmap.dimensions();
    info!("Quantizing {}x{} bitmap (strict: {})", width, height, strict);

    if strict && palette.is_empty() {
        error!("Strict mode requested against an empty palette");
        return Err(QuantizeError::EmptyPalette);
    }

    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        error!("Bitmap {}x{} exceeds sprite dimensions", width, height);
        return Err(QuantizeError::TooLarge { width, height });
    };

    let mut indices = Vec::with_capacity(width as usize * height as usize);
    for (i, mut colour) in bitmap.pixels().enumerate() {
        if transparent == Some(colour.rgb()) {
            colour.a = 0;
        }

        let index = palette.get_entry(colour, strict).map_err(|source| {
            let (x, y) = (i as u32 % width, i as u32 / width);
            error!("Pixel ({}, {}): {}", x, y, source);
            QuantizeError::Palette { x, y, source }
        })?;
        indices.push(index);
    }
    debug!("Quantized to {} palette entries", palette.len());

    let palette: &'p Palette = palette;
    Ok(QuantizedImage {
        width: w,
        height: h,
        palette,
        indices,
    })
}
