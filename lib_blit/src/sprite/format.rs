use crate::compression::{CompressedPayload, CompressionType};
use crate::palette::Colour;

pub const MAGIC_HEADER: [u8; 6] = *b"SPRITE";
/// Pixel format byte for palette-indexed sprites.
pub const FORMAT: u8 = 0x02;

/// A palette-indexed image as stored in firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRecord {
    pub width: u16,
    pub height: u16,
    pub palette: Vec<Colour>,
    pub payload: CompressedPayload,
}

impl SpriteRecord {
    pub const MAGIC_SIZE: usize = MAGIC_HEADER.len();
    pub const TYPE_SIZE: usize = 2;
    pub const SIZE_FIELD_SIZE: usize = std::mem::size_of::<u32>();
    /// Width, height, format and palette count.
    pub const DIMENSIONS_SIZE: usize = 2 * std::mem::size_of::<u16>() + 2;
    pub const COLOUR_SIZE: usize = 4;

    /// Bytes before the size field's coverage begins.
    pub const PREAMBLE_SIZE: usize = Self::MAGIC_SIZE + Self::TYPE_SIZE + Self::SIZE_FIELD_SIZE;

    pub fn kind(&self) -> CompressionType {
        self.payload.kind
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Value of the size field: everything after it up to the end of the pixel data.
    pub fn body_size(&self) -> usize {
        Self::DIMENSIONS_SIZE + self.palette.len() * Self::COLOUR_SIZE + self.payload.data.len()
    }

    /// Total encoded length of the record.
    pub fn encoded_len(&self) -> usize {
        Self::PREAMBLE_SIZE + self.body_size()
    }
}
