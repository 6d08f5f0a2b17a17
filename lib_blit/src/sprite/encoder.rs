use log::{debug, error, info};
use thiserror::Error;

use super::format::{SpriteRecord, FORMAT, MAGIC_HEADER};
use crate::compression::{compress, CompressionError, CompressionType, QuantizedImage};
use crate::palette::MAX_ENTRIES;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to compress image data")]
    CompressionFailed(#[from] CompressionError),
    #[error("Palette size {0} exceeds 256 colours")]
    PaletteTooLarge(usize),
    #[error("Palette is empty, a count of 0 would be read back as 256")]
    EmptyPalette,
    #[error("Sprite body of {0} bytes does not fit the size field")]
    TooLarge(usize),
}

impl SpriteRecord {
    /// Compresses a quantized image into a record, snapshotting its palette.
    ///
    /// With `kind` unset the smaller of packed and run-length is chosen.
    pub fn from_image(
        image: &QuantizedImage<'_>,
        kind: Option<CompressionType>,
    ) -> Result<Self, EncodingError> {
        let palette = image.palette.entries().to_vec();
        if palette.len() > MAX_ENTRIES {
            return Err(EncodingError::PaletteTooLarge(palette.len()));
        }
        let payload = compress(&image.indices, palette.len(), kind)?;

        Ok(Self {
            width: image.width,
            height: image.height,
            palette,
            payload,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        encode(self)
    }
}

pub fn encode(record: &SpriteRecord) -> Result<Vec<u8>, EncodingError> {
    info!(
        "Encoding {}x{} {} sprite",
        record.width,
        record.height,
        record.kind()
    );

    // Step 1: Palette count, where 256 wraps to 0
    let palette_count = match record.palette.len() {
        0 => {
            error!("Refusing to encode a sprite with an empty palette");
            return Err(EncodingError::EmptyPalette);
        }
        MAX_ENTRIES => 0,
        n if n < MAX_ENTRIES => n as u8,
        n => {
            error!(
                "Palette size {} exceeds the maximum allowed limit of 256 colours",
                n
            );
            return Err(EncodingError::PaletteTooLarge(n));
        }
    };

    let size = u32::try_from(record.body_size())
        .map_err(|_| EncodingError::TooLarge(record.body_size()))?;

    // Step 2: Header
    let mut encoded_data = Vec::with_capacity(record.encoded_len());
    encoded_data.extend_from_slice(&MAGIC_HEADER);
    encoded_data.extend_from_slice(&record.kind().tag());
    encoded_data.extend_from_slice(&size.to_le_bytes());
    encoded_data.extend_from_slice(&record.width.to_le_bytes());
    encoded_data.extend_from_slice(&record.height.to_le_bytes());
    encoded_data.push(FORMAT);
    encoded_data.push(palette_count);
    debug!(
        "Header written: type={} size={} width={} height={}",
        record.kind(),
        size,
        record.width,
        record.height
    );

    // Step 3: Palette
    for colour in &record.palette {
        encoded_data.extend_from_slice(&colour.to_bytes());
    }
    debug!("Palette data written with {} colours", record.palette.len());

    // Step 4: Pixel data
    encoded_data.extend_from_slice(&record.payload.data);
    debug!("{} bytes of pixel data written", record.payload.data.len());

    info!("Encoding completed: {} bytes", encoded_data.len());
    Ok(encoded_data)
}
