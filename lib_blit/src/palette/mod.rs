pub mod loader;

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

pub use loader::PaletteFormat;

/// Largest number of entries an 8-bit index can address.
pub const MAX_ENTRIES: usize = 256;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Palette full: cannot add colour {0}, all 256 entries are in use")]
    PaletteFull(Colour),
    #[error("Colour {0} does not exist in palette")]
    ColourNotFound(Colour),
    #[error("Invalid {format} palette: {reason}")]
    InvalidFormat {
        format: &'static str,
        reason: String,
    },
    #[error("Palette has too many colours: {0} (max 256)")]
    TooManyColours(usize),
    #[error("Failed to read palette file")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode palette image")]
    Image(#[from] image::ImageError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Colour {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// An RGB triplet, used to name the colour that should be keyed out as transparent.
///
/// Parses from `rrggbb` hex or `r,g,b` decimal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid colour {0:?}: expected rrggbb or r,g,b")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseRgbError(s.to_string());

        if s.contains(',') {
            let parts = s
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| err())?;
            return match parts[..] {
                [r, g, b] => Ok(Rgb::new(r, g, b)),
                _ => Err(err()),
            };
        }

        if s.len() == 6 && s.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| err());
            return Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
        }

        Err(err())
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseRgbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An ordered table of up to 256 colours with a single transparent slot.
///
/// Any colour with zero alpha is interchangeable with the transparent slot,
/// whatever its RGB value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Colour>,
    transparent: Option<u8>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a palette from an ordered list of colours. The first alpha-0
    /// entry becomes the transparent slot.
    pub fn from_entries(entries: Vec<Colour>) -> Result<Self, PaletteError> {
        if entries.len() > MAX_ENTRIES {
            return Err(PaletteError::TooManyColours(entries.len()));
        }
        let transparent = entries
            .iter()
            .position(Colour::is_transparent)
            .map(|i| i as u8);

        Ok(Self {
            entries,
            transparent,
        })
    }

    /// Returns the index for `colour`, appending it unless `strict` is set.
    pub fn get_entry(&mut self, colour: Colour, strict: bool) -> Result<u8, PaletteError> {
        if colour.is_transparent() {
            if let Some(index) = self.transparent {
                return Ok(index);
            }
        }

        if let Some(index) = self.entries.iter().position(|&c| c == colour) {
            return Ok(index as u8);
        }

        if strict {
            return Err(PaletteError::ColourNotFound(colour));
        }

        if self.entries.len() >= MAX_ENTRIES {
            return Err(PaletteError::PaletteFull(colour));
        }

        let index = self.entries.len() as u8;
        self.entries.push(colour);
        if colour.is_transparent() && self.transparent.is_none() {
            debug!("Using {} at index {} as the transparent colour", colour, index);
            self.transparent = Some(index);
        }

        Ok(index)
    }

    /// Marks the opaque entry `(r, g, b, 255)` as transparent by zeroing its alpha.
    ///
    /// Returns `None` when no such entry exists; the palette is never grown.
    pub fn set_transparent_colour(&mut self, rgb: Rgb) -> Option<u8> {
        let target = Colour::opaque(rgb.r, rgb.g, rgb.b);
        let Some(index) = self.entries.iter().position(|&c| c == target) else {
            debug!("Transparent colour {:?} is not in the palette", rgb);
            return None;
        };

        self.entries[index].a = 0;
        self.transparent = Some(index as u8);
        Some(index as u8)
    }

    /// Minimum number of bits needed to index every entry, never less than one.
    pub fn bit_length(&self) -> u8 {
        bit_length_for(self.entries.len())
    }

    pub fn transparent(&self) -> Option<u8> {
        self.transparent
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Colour] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Colour> {
        self.entries.iter()
    }

    pub fn get(&self, index: u8) -> Option<Colour> {
        self.entries.get(index as usize).copied()
    }

    /// Flat RGBA bytes, four per entry.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|c| c.to_bytes()).collect()
    }
}

impl Index<usize> for Palette {
    type Output = Colour;

    fn index(&self, index: usize) -> &Colour {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a Colour;
    type IntoIter = std::slice::Iter<'a, Colour>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Bits needed to index a palette of `entries` colours, floored at one.
pub fn bit_length_for(entries: usize) -> u8 {
    let highest = entries.saturating_sub(1).max(1);
    (usize::BITS - highest.leading_zeros()) as u8
}
