use std::path::PathBuf;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::bitmap::RgbaBitmap;
use crate::compression::{quantize, CompressionType, QuantizeError};
use crate::palette::{Palette, PaletteError, Rgb};
use crate::sprite::{self, SpriteRecord};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load palette")]
    Palette(#[from] PaletteError),
    #[error("Failed to quantize image")]
    Quantize(#[from] QuantizeError),
    #[error("Failed to encode sprite")]
    Encoding(#[from] sprite::EncodingError),
}

/// Options for converting a bitmap into a sprite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Palette file to start from; an empty palette is grown otherwise.
    pub palette: Option<PathBuf>,
    /// Colour keyed out as transparent.
    pub transparent: Option<Rgb>,
    /// Bit-pack pixel data. When false pixels are stored one byte each.
    pub packed: bool,
    /// Reject colours missing from the palette instead of adding them.
    pub strict: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            palette: None,
            transparent: None,
            packed: true,
            strict: false,
        }
    }
}

/// Converts bitmaps into encoded sprites against one palette.
///
/// The palette is shared by every image built through the same asset, so
/// colours discovered in one image keep their index for the next.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    palette: Palette,
    transparent: Option<Rgb>,
    packed: bool,
    strict: bool,
}

impl ImageAsset {
    pub fn new(mut palette: Palette, options: &ImageOptions) -> Self {
        if let Some(rgb) = options.transparent {
            match palette.set_transparent_colour(rgb) {
                Some(index) => info!(
                    "Found transparent colour ({},{},{}) in palette at {}",
                    rgb.r, rgb.g, rgb.b, index
                ),
                None => warn!(
                    "Could not find transparent colour ({},{},{}) in palette",
                    rgb.r, rgb.g, rgb.b
                ),
            }
        }

        Self {
            palette,
            transparent: options.transparent,
            packed: options.packed,
            strict: options.strict,
        }
    }

    /// Loads the configured palette file, if any, and applies the options.
    pub fn from_options(options: &ImageOptions) -> Result<Self, AssetError> {
        let palette = match &options.palette {
            Some(path) => Palette::load(path)?,
            None => Palette::new(),
        };
        Ok(Self::new(palette, options))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn build(&mut self, bitmap: &RgbaBitmap) -> Result<SpriteRecord, AssetError> {
        let image = quantize(bitmap, &mut self.palette, self.transparent, self.strict)?;

        // Unpacked sprites are pinned to raw, otherwise the compressor picks
        let kind = (!self.packed).then_some(CompressionType::Raw);
        Ok(SpriteRecord::from_image(&image, kind)?)
    }

    pub fn to_binary(&mut self, bitmap: &RgbaBitmap) -> Result<Vec<u8>, AssetError> {
        Ok(self.build(bitmap)?.encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Colour;

    #[test]
    fn test_options_defaults() {
        let options: ImageOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ImageOptions::default());
        assert!(options.packed);
        assert!(!options.strict);
    }

    #[test]
    fn test_options_parse() {
        let options: ImageOptions = serde_json::from_str(
            r#"{"palette": "pico8.act", "transparent": "ff00ff", "packed": false, "strict": true}"#,
        )
        .unwrap();
        assert_eq!(options.palette, Some(PathBuf::from("pico8.act")));
        assert_eq!(options.transparent, Some(Rgb::new(255, 0, 255)));
        assert!(!options.packed);
        assert!(options.strict);

        assert!(serde_json::from_str::<ImageOptions>(r#"{"transparent": "nope"}"#).is_err());
    }

    #[test]
    fn test_asset_unpacked_is_raw() {
        let options = ImageOptions {
            packed: false,
            ..ImageOptions::default()
        };
        let mut asset = ImageAsset::new(Palette::new(), &options);
        let bitmap = RgbaBitmap::solid(4, 4, Colour::opaque(1, 2, 3));

        let sprite = asset.build(&bitmap).unwrap();
        assert_eq!(sprite.kind(), CompressionType::Raw);
        assert_eq!(sprite.payload.data, vec![0; 16]);
    }

    #[test]
    fn test_asset_applies_transparent_to_palette() {
        let palette = Palette::from_entries(vec![
            Colour::opaque(0, 0, 0),
            Colour::opaque(255, 0, 255),
        ])
        .unwrap();
        let options = ImageOptions {
            transparent: Some(Rgb::new(255, 0, 255)),
            strict: true,
            ..ImageOptions::default()
        };
        let mut asset = ImageAsset::new(palette, &options);
        assert_eq!(asset.palette()[1], Colour::new(255, 0, 255, 0));

        let bitmap = RgbaBitmap::from_colours(
            3,
            1,
            &[
                Colour::opaque(255, 0, 255),
                Colour::opaque(0, 0, 0),
                Colour::new(7, 7, 7, 0),
            ],
        )
        .unwrap();
        let sprite = asset.build(&bitmap).unwrap();
        assert_eq!(sprite.indices().unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_asset_shares_palette_between_images() {
        let mut asset = ImageAsset::new(Palette::new(), &ImageOptions::default());
        let red = Colour::opaque(255, 0, 0);
        let blue = Colour::opaque(0, 0, 255);

        asset.build(&RgbaBitmap::solid(2, 2, red)).unwrap();
        let sprite = asset
            .build(&RgbaBitmap::from_colours(2, 1, &[blue, red]).unwrap())
            .unwrap();
        assert_eq!(sprite.palette, vec![red, blue]);
        assert_eq!(sprite.indices().unwrap(), vec![1, 0]);
    }
}
