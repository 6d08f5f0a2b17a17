use log::{debug, error, info};
use thiserror::Error;

use super::format::{SpriteRecord, FORMAT, MAGIC_HEADER};
use crate::compression::{CompressedPayload, CompressionType, DecompressionError};
use crate::palette::{Colour, MAX_ENTRIES};
use crate::wire::{ByteReader, UnexpectedEof};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid format or header")]
    InvalidHeader,
    #[error("Unsupported pixel format {0:#04x}")]
    UnsupportedFormat(u8),
    #[error("Size field {size} is too small for {palette_count} palette colours")]
    InvalidSize { size: u32, palette_count: usize },
    #[error("Sprite data is truncated")]
    Truncated(#[from] UnexpectedEof),
    #[error("Record is followed by {0} unexpected bytes")]
    TrailingData(usize),
    #[error("Invalid palette index: {0} exceeds palette size of {1}")]
    InvalidPaletteIndex(usize, usize),
    #[error("{0} bytes of RGBA data do not fill a {1}x{2} image")]
    ImageBuffer(usize, u16, u16),

    #[error("Decompression failed")]
    DecompressionFailed(#[from] DecompressionError),
}

/// Decodes a sprite that must span all of `encoded_data`.
pub fn decode(encoded_data: &[u8]) -> Result<SpriteRecord, DecodeError> {
    let (record, consumed) = decode_prefix(encoded_data)?;
    if consumed != encoded_data.len() {
        error!(
            "Sprite ends at {} but data continues to {}",
            consumed,
            encoded_data.len()
        );
        return Err(DecodeError::TrailingData(encoded_data.len() - consumed));
    }
    Ok(record)
}

/// Decodes a sprite from the start of `encoded_data`, returning it with the
/// number of bytes it occupied.
pub fn decode_prefix(encoded_data: &[u8]) -> Result<(SpriteRecord, usize), DecodeError> {
    let mut reader = ByteReader::new(encoded_data);

    // Check the header and type tag
    if reader.peek(SpriteRecord::MAGIC_SIZE) != Some(&MAGIC_HEADER[..]) {
        error!("Invalid format or missing magic number in header");
        return Err(DecodeError::InvalidHeader);
    }
    reader.take(SpriteRecord::MAGIC_SIZE)?;
    let kind = CompressionType::from_tag(reader.array()?)?;
    debug!("Magic number validated, type {}", kind);

    // The size field covers everything from width to the end of the pixel data
    let size = reader.u32()?;
    let mut body = ByteReader::new(reader.take(size as usize)?);

    let width = body.u16()?;
    let height = body.u16()?;
    let format = body.u8()?;
    if format != FORMAT {
        error!("Unsupported pixel format {:#04x}", format);
        return Err(DecodeError::UnsupportedFormat(format));
    }
    let palette_count = match body.u8()? {
        0 => MAX_ENTRIES,
        n => n as usize,
    };
    debug!(
        "Image dimensions read: width={} height={} palette={}",
        width, height, palette_count
    );

    let palette_bytes = body
        .take(palette_count * SpriteRecord::COLOUR_SIZE)
        .map_err(|_| {
            error!("Size field {} cannot hold {} palette colours", size, palette_count);
            DecodeError::InvalidSize {
                size,
                palette_count,
            }
        })?;
    let palette: Vec<Colour> = palette_bytes
        .chunks_exact(SpriteRecord::COLOUR_SIZE)
        .map(|c| Colour::new(c[0], c[1], c[2], c[3]))
        .collect();

    let payload = CompressedPayload {
        kind,
        bit_length: kind.bit_length(palette_count),
        data: body.rest().to_vec(),
    };
    debug!("Compressed data length: {}", payload.data.len());

    let record = SpriteRecord {
        width,
        height,
        palette,
        payload,
    };

    // Make sure the pixel data yields exactly one index per pixel
    record.indices()?;
    info!("Decoded {}x{} {} sprite", width, height, kind);

    Ok((record, reader.position()))
}

impl SpriteRecord {
    pub fn decode(encoded_data: &[u8]) -> Result<Self, DecodeError> {
        decode(encoded_data)
    }

    /// Decompresses the pixel data into one palette index per pixel.
    pub fn indices(&self) -> Result<Vec<u8>, DecompressionError> {
        self.payload.decompress(self.pixel_count())
    }

    /// Expands the sprite to row-major RGBA bytes through its palette.
    pub fn to_rgba(&self) -> Result<Vec<u8>, DecodeError> {
        let indices = self.indices()?;
        let mut rgba_data = Vec::with_capacity(indices.len() * 4);

        for index in indices {
            let colour = self.palette.get(index as usize).ok_or_else(|| {
                error!("Palette index {} out of range", index);
                DecodeError::InvalidPaletteIndex(index as usize, self.palette.len())
            })?;
            rgba_data.extend_from_slice(&colour.to_bytes());
        }

        Ok(rgba_data)
    }

    /// Expands the sprite into an `image` buffer, ready to be saved.
    pub fn to_image(&self) -> Result<image::RgbaImage, DecodeError> {
        let rgba_data = self.to_rgba()?;
        let len = rgba_data.len();
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, rgba_data)
            .ok_or(DecodeError::ImageBuffer(len, self.width, self.height))
    }
}
