pub mod asset;
pub mod bitmap;
pub mod compression;
pub mod firmware;
pub mod meta;
pub mod palette;
pub mod sprite;
pub mod tool;
pub mod wire;

use log::*;
use std::io::Write;

pub use crate::asset::{AssetError, ImageAsset, ImageOptions};
pub use crate::bitmap::RgbaBitmap;
pub use crate::compression::{quantize, CompressionType};
pub use crate::firmware::Firmware;
pub use crate::meta::MetadataRecord;
pub use crate::palette::{Colour, Palette, Rgb};
pub use crate::sprite::SpriteRecord;

/// Logs this crate to stderr as `[LEVEL file:line] message`.
///
/// Only the first call installs the logger.
pub fn init_logging(verbose: bool) -> Result<(), SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter(Some("lib_blit"), level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
}
