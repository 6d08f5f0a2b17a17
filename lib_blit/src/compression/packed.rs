use super::bits::{BitReader, BitWriter};
use super::DecompressionError;

/// Packs each index into a `bit_length`-wide field with no padding between
/// values. The final byte is padded with zero bits.
pub fn packed_compression(indices: &[u8], bit_length: u8) -> Vec<u8> {
    let mut writer = BitWriter::new();
    for &index in indices {
        writer.write(index as u32, bit_length);
    }
    writer.finish()
}

/// Number of bytes a packed stream of `pixels` indices occupies.
pub fn packed_len(pixels: usize, bit_length: u8) -> usize {
    (pixels * bit_length as usize).div_ceil(8)
}

pub fn packed_decompression(
    data: &[u8],
    bit_length: u8,
    pixels: usize,
) -> Result<Vec<u8>, DecompressionError> {
    let expected = packed_len(pixels, bit_length);
    if data.len() < expected {
        return Err(DecompressionError::Truncated {
            expected: pixels,
            decoded: data.len() * 8 / bit_length as usize,
        });
    }
    if data.len() > expected {
        return Err(DecompressionError::TrailingData(data.len() - expected));
    }

    let mut reader = BitReader::new(data);
    let mut indices = Vec::with_capacity(pixels);
    while indices.len() < pixels {
        let value = reader.read(bit_length).ok_or(DecompressionError::Truncated {
            expected: pixels,
            decoded: indices.len(),
        })?;
        indices.push(value as u8);
    }

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_reference_bytes() {
        // Two pixels at two bits each: 00 01, then zero padding
        assert_eq!(packed_compression(&[0, 1], 2), vec![0x10]);
        assert_eq!(packed_compression(&[1, 0, 1, 1, 0, 0, 0, 1, 1], 1), vec![0b1011_0001, 0b1000_0000]);
        assert_eq!(packed_compression(&[0xAB, 0x01], 8), vec![0xAB, 0x01]);
    }

    #[test]
    fn test_packed_round_trip() {
        for bit_length in 1..=8u8 {
            let max = (1u16 << bit_length) - 1;
            let indices: Vec<u8> = (0..97u16).map(|i| (i * 7 % (max + 1)) as u8).collect();
            let packed = packed_compression(&indices, bit_length);
            assert_eq!(packed.len(), packed_len(indices.len(), bit_length));
            let unpacked = packed_decompression(&packed, bit_length, indices.len()).unwrap();
            assert_eq!(unpacked, indices, "bit_length = {}", bit_length);
        }
    }

    #[test]
    fn test_packed_truncated() {
        let packed = packed_compression(&[3, 3, 3, 3, 3], 2);
        assert!(matches!(
            packed_decompression(&packed[..1], 2, 5),
            Err(DecompressionError::Truncated { expected: 5, decoded: 4 })
        ));
    }

    #[test]
    fn test_packed_trailing_data() {
        assert!(matches!(
            packed_decompression(&[0, 0, 0], 4, 2),
            Err(DecompressionError::TrailingData(2))
        ));
    }

    #[test]
    fn test_packed_empty() {
        assert!(packed_compression(&[], 3).is_empty());
        assert!(packed_decompression(&[], 3, 0).unwrap().is_empty());
    }
}
