mod common;

use common::{golden_bitmap, stripes, GOLDEN_INDICES, MAGENTA, RED};
use lib_blit::compression::{compress, decompress, DecompressionError};
use lib_blit::{quantize, CompressionType, Palette, RgbaBitmap};

#[test]
fn test_quantize_golden_image() {
    let mut palette = Palette::new();
    let image = quantize(&golden_bitmap(), &mut palette, Some(MAGENTA.rgb()), false).unwrap();

    assert_eq!(image.indices, GOLDEN_INDICES);
    assert_eq!(palette.len(), 4);
    assert_eq!(palette.transparent(), Some(3));
    assert!(palette[3].is_transparent());
    assert_eq!(palette.bit_length(), 2);
}

#[test]
fn test_compress_golden_indices() {
    let packed = compress(&GOLDEN_INDICES, 4, Some(CompressionType::Packed)).unwrap();
    assert_eq!(packed.data, vec![0x00, 0x6f]);

    let rle = compress(&GOLDEN_INDICES, 4, Some(CompressionType::RunLength)).unwrap();
    assert_eq!(rle.data, vec![0x81, 0x85, 0x36]);

    let auto = compress(&GOLDEN_INDICES, 4, None).unwrap();
    assert_eq!(auto, packed);
}

#[test]
fn test_compress_three_colour_palette() {
    let payload = compress(&[0, 1], 3, Some(CompressionType::Packed)).unwrap();
    assert_eq!(payload.bit_length, 2);
    assert_eq!(payload.data, vec![0x10]);
}

#[test]
fn test_compress_solid_prefers_run_length() {
    let mut palette = Palette::new();
    let image = quantize(&RgbaBitmap::solid(8, 8, RED), &mut palette, None, false).unwrap();

    let payload = compress(&image.indices, image.palette.len(), None).unwrap();
    assert_eq!(payload.kind, CompressionType::RunLength);
    assert_eq!(payload.bit_length, 1);
    assert_eq!(payload.data, vec![0x9f, 0x80]);
    assert_eq!(payload.decompress(64).unwrap(), vec![0; 64]);
}

#[test]
fn test_compress_splits_long_runs() {
    let payload = compress(&[0; 300], 2, Some(CompressionType::RunLength)).unwrap();
    assert_eq!(payload.data, vec![0xff, 0xa5, 0x60]);
    assert_eq!(payload.decompress(300).unwrap(), vec![0; 300]);
}

#[test]
fn test_quantize_compress_stripes() {
    let bitmap = stripes(32, 16);
    let mut palette = Palette::new();
    let image = quantize(&bitmap, &mut palette, None, false).unwrap();
    assert_eq!(image.palette.len(), 16);

    for kind in [
        CompressionType::Raw,
        CompressionType::Packed,
        CompressionType::RunLength,
    ] {
        let payload = compress(&image.indices, image.palette.len(), Some(kind)).unwrap();
        assert_eq!(payload.decompress(image.indices.len()).unwrap(), image.indices);
    }

    let packed = compress(
        &image.indices,
        image.palette.len(),
        Some(CompressionType::Packed),
    )
    .unwrap();
    assert_eq!(packed.data.len(), 32 * 16 * 4 / 8);
}

#[test]
fn test_decompress_rejects_short_data() {
    assert!(matches!(
        decompress(CompressionType::Packed, &[0x00, 0x6f], 2, 9),
        Err(DecompressionError::Truncated { .. })
    ));
    assert!(matches!(
        decompress(CompressionType::Raw, &[0, 1, 2], 8, 2),
        Err(DecompressionError::TrailingData(1))
    ));
}
