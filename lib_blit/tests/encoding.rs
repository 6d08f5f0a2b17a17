mod common;

use common::{
    golden_bitmap, stripes, BLUE, GOLDEN_INDICES, GOLDEN_PIXELS, GOLDEN_SPRITE, MAGENTA, RED,
};
use lib_blit::compression::DecompressionError;
use lib_blit::sprite::{self, DecodeError};
use lib_blit::{
    quantize, Colour, CompressionType, ImageAsset, ImageOptions, Palette, RgbaBitmap,
    SpriteRecord,
};

fn golden_options() -> ImageOptions {
    ImageOptions {
        transparent: Some(MAGENTA.rgb()),
        ..ImageOptions::default()
    }
}

#[test]
fn test_encode_golden_sprite() {
    let mut asset = ImageAsset::new(Palette::new(), &golden_options());
    let encoded = asset.to_binary(&golden_bitmap()).unwrap();
    assert_eq!(encoded, GOLDEN_SPRITE);
}

#[test]
fn test_decode_golden_sprite() {
    let record = SpriteRecord::decode(&GOLDEN_SPRITE).unwrap();

    assert_eq!(record.width, 4);
    assert_eq!(record.height, 2);
    assert_eq!(record.kind(), CompressionType::Packed);
    assert_eq!(record.payload.bit_length, 2);
    assert_eq!(record.palette[3], Colour::new(255, 0, 255, 0));
    assert_eq!(record.indices().unwrap(), GOLDEN_INDICES);

    // Keyed and transparent pixels both come back through the transparent slot
    let mut expected = GOLDEN_PIXELS;
    expected[6] = Colour::new(255, 0, 255, 0);
    expected[7] = Colour::new(255, 0, 255, 0);
    let expected: Vec<u8> = expected.iter().flat_map(|c| c.to_bytes()).collect();
    assert_eq!(record.to_rgba().unwrap(), expected);

    assert_eq!(record.encode().unwrap(), GOLDEN_SPRITE);
}

#[test]
fn test_encode_decode_byte_identity() {
    let bitmap = stripes(24, 10);
    for packed in [true, false] {
        let options = ImageOptions {
            packed,
            ..ImageOptions::default()
        };
        let mut asset = ImageAsset::new(Palette::new(), &options);
        let encoded = asset.to_binary(&bitmap).unwrap();

        let decoded = sprite::decode(&encoded).unwrap();
        assert_eq!(decoded.to_rgba().unwrap(), bitmap.rgba_data());
        assert_eq!(sprite::encode(&decoded).unwrap(), encoded);
    }
}

#[test]
fn test_encode_full_palette_count_is_zero() {
    let colours: Vec<Colour> = (0..=255).map(|i| Colour::opaque(i, i, 255 - i)).collect();
    let bitmap = RgbaBitmap::from_colours(16, 16, &colours).unwrap();

    let mut palette = Palette::new();
    let image = quantize(&bitmap, &mut palette, None, false).unwrap();
    assert_eq!(image.palette.len(), 256);

    let record = SpriteRecord::from_image(&image, None).unwrap();
    let encoded = record.encode().unwrap();
    assert_eq!(encoded[17], 0);
    assert_eq!(record.payload.bit_length, 8);

    let decoded = SpriteRecord::decode(&encoded).unwrap();
    assert_eq!(decoded.palette.len(), 256);
    assert_eq!(decoded.to_rgba().unwrap(), bitmap.rgba_data());
}

#[test]
fn test_encode_single_colour_sprite() {
    let mut asset = ImageAsset::new(Palette::new(), &ImageOptions::default());
    let encoded = asset.to_binary(&RgbaBitmap::solid(8, 8, BLUE)).unwrap();

    assert_eq!(&encoded[6..8], b"RL");
    assert_eq!(encoded[17], 1);
    let decoded = SpriteRecord::decode(&encoded).unwrap();
    assert_eq!(decoded.indices().unwrap(), vec![0; 64]);
}

#[test]
fn test_decode_rejects_bad_records() {
    assert!(matches!(
        sprite::decode(b"SPRITZPK"),
        Err(DecodeError::InvalidHeader)
    ));

    let mut wrong_format = GOLDEN_SPRITE;
    wrong_format[16] = 0x01;
    assert!(matches!(
        sprite::decode(&wrong_format),
        Err(DecodeError::UnsupportedFormat(0x01))
    ));

    assert!(sprite::decode(&GOLDEN_SPRITE[..30]).is_err());

    let mut trailing = GOLDEN_SPRITE.to_vec();
    trailing.push(0);
    assert!(sprite::decode(&trailing).is_err());
    let (record, consumed) = sprite::decode_prefix(&trailing).unwrap();
    assert_eq!(consumed, GOLDEN_SPRITE.len());
    assert_eq!(record.indices().unwrap(), GOLDEN_INDICES);
}

#[test]
fn test_strict_palette_rejects_unknown_colour() {
    let palette = Palette::from_entries(vec![RED, BLUE]).unwrap();
    let options = ImageOptions {
        strict: true,
        ..ImageOptions::default()
    };
    let mut asset = ImageAsset::new(palette, &options);

    assert!(asset.build(&RgbaBitmap::solid(2, 2, RED)).is_ok());
    assert!(asset.build(&golden_bitmap()).is_err());
    assert_eq!(asset.palette().len(), 2);
}

#[test]
fn test_decode_run_length_with_oversized_dimensions() {
    let mut record = b"SPRITERL".to_vec();
    record.extend_from_slice(&11u32.to_le_bytes());
    record.extend_from_slice(&u16::MAX.to_le_bytes());
    record.extend_from_slice(&u16::MAX.to_le_bytes());
    record.extend_from_slice(&[0x02, 0x01, 0xff, 0x00, 0x00, 0xff]);
    // Four one-bit literals
    record.push(0x55);

    assert!(matches!(
        sprite::decode(&record),
        Err(DecodeError::DecompressionFailed(
            DecompressionError::Truncated { decoded: 4, .. }
        ))
    ));
}
