pub mod bits;
pub mod packed;
pub mod quantize;
pub mod runlength;

use std::fmt;

use log::{debug, error, info};
use thiserror::Error;

pub use quantize::{quantize, QuantizeError, QuantizedImage};

use crate::palette::bit_length_for;

/// Bit width used by uncompressed pixel data.
pub const RAW_BIT_LENGTH: u8 = 8;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Index {index} does not fit in {bit_length} bits")]
    IndexOutOfRange { index: u8, bit_length: u8 },
}

#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("Unknown compression type {0:?}")]
    UnknownType([u8; 2]),
    #[error("Truncated pixel data: expected {expected} pixels, decoded {decoded}")]
    Truncated { expected: usize, decoded: usize },
    #[error("Run overruns pixel data: expected {expected} pixels, run ends at {decoded}")]
    Overrun { expected: usize, decoded: usize },
    #[error("Pixel data has {0} trailing bytes")]
    TrailingData(usize),
}

/// How pixel indices are laid out in a sprite's pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionType {
    /// One byte per index.
    Raw,
    /// Indices bit-packed at the palette's bit width.
    Packed,
    /// Run-length units over bit-packed indices.
    RunLength,
}

impl CompressionType {
    pub const fn tag(self) -> [u8; 2] {
        match self {
            CompressionType::Raw => *b"RW",
            CompressionType::Packed => *b"PK",
            CompressionType::RunLength => *b"RL",
        }
    }

    pub fn from_tag(tag: [u8; 2]) -> Result<Self, DecompressionError> {
        match &tag {
            b"RW" => Ok(CompressionType::Raw),
            b"PK" => Ok(CompressionType::Packed),
            b"RL" => Ok(CompressionType::RunLength),
            _ => Err(DecompressionError::UnknownType(tag)),
        }
    }

    /// Bit width of each index for a palette of `palette_len` entries.
    pub fn bit_length(self, palette_len: usize) -> u8 {
        match self {
            CompressionType::Raw => RAW_BIT_LENGTH,
            CompressionType::Packed | CompressionType::RunLength => bit_length_for(palette_len),
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        write!(f, "{}{}", tag[0] as char, tag[1] as char)
    }
}

/// Encoded pixel data plus what is needed to read it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedPayload {
    pub kind: CompressionType,
    pub bit_length: u8,
    pub data: Vec<u8>,
}

impl CompressedPayload {
    pub fn decompress(&self, pixels: usize) -> Result<Vec<u8>, DecompressionError> {
        decompress(self.kind, &self.data, self.bit_length, pixels)
    }
}

/// Compresses palette indices for a palette of `palette_len` entries.
///
/// With `kind` unset both packed and run-length encodings are produced and
/// packed is kept only when strictly smaller, so run-length wins ties.
pub fn compress(
    indices: &[u8],
    palette_len: usize,
    kind: Option<CompressionType>,
) -> Result<CompressedPayload, CompressionError> {
    info!("Starting compression of {} pixels", indices.len());

    let bit_length = kind
        .unwrap_or(CompressionType::Packed)
        .bit_length(palette_len);

    if bit_length < RAW_BIT_LENGTH {
        if let Some(&index) = indices.iter().find(|&&i| i >> bit_length != 0) {
            error!("Index {} exceeds {} bit palette", index, bit_length);
            return Err(CompressionError::IndexOutOfRange { index, bit_length });
        }
    }

    let payload = match kind {
        Some(kind) => CompressedPayload {
            kind,
            bit_length,
            data: encode_with(kind, indices, bit_length),
        },
        None => {
            let packed = packed::packed_compression(indices, bit_length);
            let rle = runlength::rle_compression(indices, bit_length);
            debug!(
                "Packed: {} bytes, run-length: {} bytes",
                packed.len(),
                rle.len()
            );

            if packed.len() < rle.len() {
                CompressedPayload {
                    kind: CompressionType::Packed,
                    bit_length,
                    data: packed,
                }
            } else {
                CompressedPayload {
                    kind: CompressionType::RunLength,
                    bit_length,
                    data: rle,
                }
            }
        }
    };

    info!(
        "Compression completed: {} as {} bytes ({}-bit)",
        payload.kind,
        payload.data.len(),
        payload.bit_length
    );
    Ok(payload)
}

fn encode_with(kind: CompressionType, indices: &[u8], bit_length: u8) -> Vec<u8> {
    match kind {
        CompressionType::Raw => indices.to_vec(),
        CompressionType::Packed => packed::packed_compression(indices, bit_length),
        CompressionType::RunLength => runlength::rle_compression(indices, bit_length),
    }
}

/// Rebuilds exactly `pixels` indices from compressed data.
pub fn decompress(
    kind: CompressionType,
    data: &[u8],
    bit_length: u8,
    pixels: usize,
) -> Result<Vec<u8>, DecompressionError> {
    debug!(
        "Decompressing {} bytes of {} data into {} pixels",
        data.len(),
        kind,
        pixels
    );

    let result = match kind {
        CompressionType::Raw => {
            if data.len() < pixels {
                Err(DecompressionError::Truncated {
                    expected: pixels,
                    decoded: data.len(),
                })
            } else if data.len() > pixels {
                Err(DecompressionError::TrailingData(data.len() - pixels))
            } else {
                Ok(data.to_vec())
            }
        }
        CompressionType::Packed => packed::packed_decompression(data, bit_length, pixels),
        CompressionType::RunLength => runlength::rle_decompression(data, bit_length, pixels),
    };

    if let Err(ref e) = result {
        error!("Decompression failed: {}", e);
    }
    result
}
