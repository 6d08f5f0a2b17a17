use super::bits::{BitReader, BitWriter};
use super::DecompressionError;

/// Longest run a single repeat unit can describe.
const MAX_RUN: usize = 0x100;
const REPEAT_FLAG: bool = true;
const LITERAL_FLAG: bool = false;

/// Run length below which per-pixel literals are no larger than a repeat unit.
pub fn break_even(bit_length: u8) -> usize {
    8usize.div_ceil(bit_length as usize + 1)
}

/// Splits a sequence into maximal runs of identical values as `(value, count)`.
fn repetitions(indices: &[u8]) -> impl Iterator<Item = (u8, usize)> + '_ {
    indices
        .chunk_by(|a, b| a == b)
        .map(|run| (run[0], run.len()))
}

/// Run-length encodes palette indices.
///
/// A repeat unit is a set flag bit, the repeat count minus one in 8 bits and
/// the value. A literal unit is a clear flag bit followed by the value.
pub fn rle_compression(indices: &[u8], bit_length: u8) -> Vec<u8> {
    let break_even = break_even(bit_length);
    let mut writer = BitWriter::new();

    for (value, mut count) in repetitions(indices) {
        while count > break_even {
            let chunk = count.min(MAX_RUN);
            writer.write_bit(REPEAT_FLAG);
            writer.write((chunk - 1) as u32, 8);
            writer.write(value as u32, bit_length);
            count -= chunk;
        }
        for _ in 0..count {
            writer.write_bit(LITERAL_FLAG);
            writer.write(value as u32, bit_length);
        }
    }

    writer.finish()
}

pub fn rle_decompression(
    data: &[u8],
    bit_length: u8,
    pixels: usize,
) -> Result<Vec<u8>, DecompressionError> {
    let mut reader = BitReader::new(data);
    // `pixels` comes from the record header, so only reserve what the data could cover
    let mut indices = Vec::with_capacity(pixels.min(data.len().saturating_mul(MAX_RUN)));

    let truncated = |decoded: usize| DecompressionError::Truncated {
        expected: pixels,
        decoded,
    };

    while indices.len() < pixels {
        let flag = reader.read_bit().ok_or_else(|| truncated(indices.len()))?;
        let count = if flag == REPEAT_FLAG {
            reader.read(8).ok_or_else(|| truncated(indices.len()))? as usize + 1
        } else {
            1
        };
        let value = reader
            .read(bit_length)
            .ok_or_else(|| truncated(indices.len()))?;

        if indices.len() + count > pixels {
            return Err(DecompressionError::Overrun {
                expected: pixels,
                decoded: indices.len() + count,
            });
        }
        indices.resize(indices.len() + count, value as u8);
    }

    Ok(indices)
}
