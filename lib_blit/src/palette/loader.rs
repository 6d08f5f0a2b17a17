use std::path::Path;

use log::{debug, error, info};

use super::{Colour, Palette, PaletteError, MAX_ENTRIES};

/// Size of a full table of 256 RGB triplets.
const RGB_TABLE_SIZE: usize = MAX_ENTRIES * 3;
/// Adobe colour tables append a big-endian colour count and transparency index.
const ACT_SIZE: usize = RGB_TABLE_SIZE + 4;

/// The palette file formats understood by [`Palette::load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteFormat {
    /// Adobe Colour Table (`.act`)
    Act,
    /// Raw 768-byte RGB table, as written by Pro Motion NG (`.pal`)
    Pal,
    /// GIMP palette text file (`.gpl`)
    Gpl,
    /// Any bitmap the `image` crate can decode, read as a strip of colours
    Image,
}

impl PaletteFormat {
    /// Picks a format from a file extension, falling back to [`PaletteFormat::Image`].
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("act") => PaletteFormat::Act,
            Some("pal") => PaletteFormat::Pal,
            Some("gpl") => PaletteFormat::Gpl,
            _ => PaletteFormat::Image,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PaletteFormat::Act => "Adobe .act",
            PaletteFormat::Pal => "raw .pal",
            PaletteFormat::Gpl => "GIMP .gpl",
            PaletteFormat::Image => "image",
        }
    }

    fn invalid(self, reason: impl Into<String>) -> PaletteError {
        let reason = reason.into();
        error!("Invalid {} palette: {}", self.name(), reason);
        PaletteError::InvalidFormat {
            format: self.name(),
            reason,
        }
    }
}

impl Palette {
    /// Loads a palette file, choosing the parser from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let path = path.as_ref();
        let format = PaletteFormat::from_path(path);
        info!("Loading {} palette from {}", format.name(), path.display());

        let data = std::fs::read(path)?;
        Self::from_bytes(format, &data)
    }

    /// Parses palette data already in memory.
    pub fn from_bytes(format: PaletteFormat, data: &[u8]) -> Result<Self, PaletteError> {
        let entries = match format {
            PaletteFormat::Act => parse_act(data)?,
            PaletteFormat::Pal => parse_pal(data)?,
            PaletteFormat::Gpl => parse_gpl(data)?,
            PaletteFormat::Image => parse_image(data)?,
        };
        debug!("Loaded {} palette entries", entries.len());

        Palette::from_entries(entries)
    }
}

fn rgb_triplets(data: &[u8], count: usize) -> Vec<Colour> {
    data.chunks_exact(3)
        .take(count)
        .map(|c| Colour::opaque(c[0], c[1], c[2]))
        .collect()
}

fn parse_act(data: &[u8]) -> Result<Vec<Colour>, PaletteError> {
    if data.len() < ACT_SIZE {
        return Err(PaletteFormat::Act.invalid(format!(
            "length {} is shorter than {}",
            data.len(),
            ACT_SIZE
        )));
    }

    let count = u16::from_be_bytes([data[RGB_TABLE_SIZE], data[RGB_TABLE_SIZE + 1]]) as usize;
    if count > MAX_ENTRIES {
        error!("Adobe .act palette declares {} colours", count);
        return Err(PaletteError::TooManyColours(count));
    }

    Ok(rgb_triplets(&data[..RGB_TABLE_SIZE], count))
}

fn parse_pal(data: &[u8]) -> Result<Vec<Colour>, PaletteError> {
    // There's no length in a raw .pal, so it is always a full 256 colour table
    if data.len() < RGB_TABLE_SIZE {
        return Err(PaletteFormat::Pal.invalid(format!(
            "length {} is shorter than {}",
            data.len(),
            RGB_TABLE_SIZE
        )));
    }

    Ok(rgb_triplets(&data[..RGB_TABLE_SIZE], MAX_ENTRIES))
}

fn parse_gpl(data: &[u8]) -> Result<Vec<Colour>, PaletteError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| PaletteFormat::Gpl.invalid("file is not valid UTF-8"))?;

    let mut lines = text.lines().map(str::trim).skip_while(|l| l.is_empty());
    if lines.next() != Some("GIMP Palette") {
        return Err(PaletteFormat::Gpl.invalid("missing \"GIMP Palette\" header"));
    }

    let mut entries = Vec::new();
    for line in lines {
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("Name:")
            || line.starts_with("Columns:")
        {
            continue;
        }

        let channels = line
            .split_whitespace()
            .take(3)
            .map(|c| c.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PaletteFormat::Gpl.invalid(format!("bad entry {:?}", line)))?;

        let [r, g, b] = channels[..] else {
            return Err(PaletteFormat::Gpl.invalid(format!("bad entry {:?}", line)));
        };
        entries.push(Colour::opaque(r, g, b));
    }

    if entries.len() > MAX_ENTRIES {
        return Err(PaletteError::TooManyColours(entries.len()));
    }

    Ok(entries)
}

fn parse_image(data: &[u8]) -> Result<Vec<Colour>, PaletteError> {
    let image = image::load_from_memory(data)?.to_rgba8();
    let (width, height) = image.dimensions();

    let pixels = width as usize * height as usize;
    if pixels > MAX_ENTRIES {
        error!(
            "Palette image has too many pixels {}x{}={} (max {})",
            width, height, pixels, MAX_ENTRIES
        );
        return Err(PaletteError::TooManyColours(pixels));
    }
    info!("Using palette image {}x{}", width, height);

    Ok(image.pixels().map(|p| Colour::from(p.0)).collect())
}
