use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::asset::{AssetError, ImageAsset, ImageOptions};
use crate::bitmap::RgbaBitmap;
use crate::firmware::{Firmware, FirmwareError};
use crate::meta::MetadataRecord;
use crate::sprite::{self, SpriteRecord};

pub const ICON_SIZE: (u32, u32) = (8, 8);
pub const SPLASH_SIZE: (u32, u32) = (128, 96);

/// Format of the metadata date stamp.
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%S";

const TITLE_MAX: usize = 24;
const DESCRIPTION_MAX: usize = 128;
const VERSION_MAX: usize = 16;
const AUTHOR_MAX: usize = 16;
const CATEGORY_MAX: usize = 16;
const URL_MAX: usize = 128;
const FILETYPE_MAX: usize = 4;

#[derive(Error, Debug)]
pub enum MetadataToolError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} should be a maximum of {max} characters, got {len}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("Filetype {0:?} should be 1 to 4 characters (don't include the .)")]
    InvalidFiletype(String),
    #[error("{image} must be {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        image: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Firmware already has metadata, refusing to overwrite")]
    MetadataExists,
    #[error("Failed to build {image}")]
    Asset {
        image: &'static str,
        #[source]
        source: AssetError,
    },
    #[error("Invalid firmware")]
    Firmware(#[from] FirmwareError),
    #[error("Failed to expand sprite")]
    Sprite(#[from] sprite::DecodeError),
    #[error("Failed to write image")]
    Image(#[from] image::ImageError),
}

/// User-supplied metadata for a game, as read from its config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub title: Option<String>,
    pub description: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub category: String,
    pub url: String,
    /// Accepts a list or a single space-separated string.
    #[serde(deserialize_with = "deserialize_filetypes")]
    pub filetypes: Vec<String>,
    pub icon: ImageOptions,
    pub splash: ImageOptions,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            title: None,
            description: String::new(),
            version: None,
            author: None,
            category: "none".to_string(),
            url: String::new(),
            filetypes: Vec::new(),
            icon: ImageOptions::default(),
            splash: ImageOptions::default(),
        }
    }
}

fn deserialize_filetypes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Filetypes {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Filetypes::deserialize(deserializer)? {
        Filetypes::List(list) => list,
        Filetypes::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
    })
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, MetadataToolError> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            error!("{} is required", field);
            Err(MetadataToolError::MissingField(field))
        }
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), MetadataToolError> {
    if value.len() > max {
        error!("{} should be a maximum of {} characters", field, max);
        return Err(MetadataToolError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

fn check_dimensions(
    image: &'static str,
    bitmap: &RgbaBitmap,
    expected: (u32, u32),
) -> Result<(), MetadataToolError> {
    if bitmap.dimensions() != expected {
        error!(
            "{} is {}x{}, expected {}x{}",
            image,
            bitmap.width(),
            bitmap.height(),
            expected.0,
            expected.1
        );
        return Err(MetadataToolError::DimensionMismatch {
            image,
            expected,
            actual: bitmap.dimensions(),
        });
    }
    Ok(())
}

impl MetadataConfig {
    pub fn validate(&self) -> Result<(), MetadataToolError> {
        check_len("title", required("title", &self.title)?, TITLE_MAX)?;
        check_len("version", required("version", &self.version)?, VERSION_MAX)?;
        check_len("author", required("author", &self.author)?, AUTHOR_MAX)?;
        check_len("description", &self.description, DESCRIPTION_MAX)?;
        check_len("category", &self.category, CATEGORY_MAX)?;
        check_len("url", &self.url, URL_MAX)?;

        if let Some(bad) = self
            .filetypes
            .iter()
            .find(|f| f.is_empty() || f.len() > FILETYPE_MAX)
        {
            error!("Invalid filetype {:?}", bad);
            return Err(MetadataToolError::InvalidFiletype(bad.clone()));
        }

        Ok(())
    }
}

/// Date stamp for a new metadata record.
pub fn current_date() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

fn build_image(
    image: &'static str,
    bitmap: &RgbaBitmap,
    options: &ImageOptions,
) -> Result<SpriteRecord, MetadataToolError> {
    let wrap = |source| MetadataToolError::Asset { image, source };
    let mut asset = ImageAsset::from_options(options).map_err(wrap)?;
    asset.build(bitmap).map_err(wrap)
}

/// Validates `config` and the two images, then builds an unbound metadata
/// record. The checksum is zero until the record is attached to a firmware.
pub fn build_metadata(
    config: &MetadataConfig,
    icon: &RgbaBitmap,
    splash: &RgbaBitmap,
    date: &str,
) -> Result<MetadataRecord, MetadataToolError> {
    config.validate()?;
    check_dimensions("icon", icon, ICON_SIZE)?;
    check_dimensions("splash", splash, SPLASH_SIZE)?;

    let icon = build_image("icon", icon, &config.icon)?;
    let splash = build_image("splash", splash, &config.splash)?;

    Ok(MetadataRecord {
        checksum: 0,
        date: date.to_string(),
        title: config.title.clone().unwrap_or_default(),
        description: config.description.clone(),
        version: config.version.clone().unwrap_or_default(),
        author: config.author.clone().unwrap_or_default(),
        category: config.category.clone(),
        url: config.url.clone(),
        filetypes: config.filetypes.clone(),
        icon,
        splash,
    })
}

/// Attaches `metadata` to a firmware image, binding its checksum to the
/// firmware's binary. Existing metadata is only replaced when `force` is set.
pub fn tag_firmware(
    firmware_data: &[u8],
    metadata: MetadataRecord,
    force: bool,
) -> Result<Vec<u8>, MetadataToolError> {
    let mut firmware = Firmware::parse(firmware_data)?;

    if firmware.metadata.is_some() && !force {
        error!("Refusing to overwrite existing metadata");
        return Err(MetadataToolError::MetadataExists);
    }

    info!("Adding metadata {:?} to firmware", metadata.title);
    firmware.set_metadata(metadata);
    Ok(firmware.encode()?)
}

/// A human readable summary of a firmware image and its metadata.
pub struct Summary<'a>(pub &'a Firmware);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let firmware = self.0;
        writeln!(f, "Length:      {} bytes", firmware.binary.binary_size())?;
        match &firmware.relocs {
            Some(relocs) => writeln!(f, "Relocations: Yes ({})", relocs.len())?,
            None => writeln!(f, "Relocations: No")?,
        }

        let Some(meta) = &firmware.metadata else {
            return writeln!(f, "Metadata:    No");
        };

        writeln!(f, "Metadata:    Yes")?;
        for (field, value) in [
            ("Title", &meta.title),
            ("Description", &meta.description),
            ("Version", &meta.version),
            ("Author", &meta.author),
            ("Category", &meta.category),
            ("Url", &meta.url),
        ] {
            writeln!(f, "{:13}{}", format!("{}:", field), value)?;
        }
        if !meta.filetypes.is_empty() {
            writeln!(f, "Filetypes:   {}", meta.filetypes.join(" "))?;
        }
        for (name, image) in [("Icon", &meta.icon), ("Splash", &meta.splash)] {
            writeln!(
                f,
                "{:13}{}x{} ({} colours)",
                format!("{}:", name),
                image.width,
                image.height,
                image.palette.len()
            )?;
        }
        Ok(())
    }
}

pub fn describe(firmware: &Firmware) -> String {
    Summary(firmware).to_string()
}

/// Writes a sprite back out as a PNG.
pub fn dump_image(sprite: &SpriteRecord, path: impl AsRef<Path>) -> Result<(), MetadataToolError> {
    let path = path.as_ref();
    let buffer = sprite.to_image()?;
    buffer.save_with_format(path, image::ImageFormat::Png)?;
    info!(
        "Dumped {}x{} sprite to {}",
        sprite.width,
        sprite.height,
        path.display()
    );
    Ok(())
}

/// Dumps a record's icon and splash into `dir` as `<stem>-icon.png` and
/// `<stem>-splash.png`, returning the written paths.
pub fn dump_images(
    metadata: &MetadataRecord,
    dir: impl AsRef<Path>,
    stem: &str,
) -> Result<[PathBuf; 2], MetadataToolError> {
    let dir = dir.as_ref();
    let icon = dir.join(format!("{}-icon.png", stem));
    let splash = dir.join(format!("{}-splash.png", stem));
    dump_image(&metadata.icon, &icon)?;
    dump_image(&metadata.splash, &splash)?;
    Ok([icon, splash])
}
