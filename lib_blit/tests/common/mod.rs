#![allow(dead_code)]

use lib_blit::firmware::BLIT_HEADER_SIZE;
use lib_blit::{Colour, RgbaBitmap};

pub const RED: Colour = Colour::opaque(255, 0, 0);
pub const GREEN: Colour = Colour::opaque(0, 255, 0);
pub const BLUE: Colour = Colour::opaque(0, 0, 255);
pub const MAGENTA: Colour = Colour::opaque(255, 0, 255);

pub const GOLDEN_WIDTH: u32 = 4;
pub const GOLDEN_HEIGHT: u32 = 2;

/// Four reds, green, blue, the magenta key and an already transparent pixel.
pub const GOLDEN_PIXELS: [Colour; 8] = [
    RED,
    RED,
    RED,
    RED,
    GREEN,
    BLUE,
    MAGENTA,
    Colour::new(1, 2, 3, 0),
];

pub const GOLDEN_INDICES: [u8; 8] = [0, 0, 0, 0, 1, 2, 3, 3];

/// The golden image quantized with magenta as the transparent key.
pub const GOLDEN_SPRITE: [u8; 36] = [
    b'S', b'P', b'R', b'I', b'T', b'E', b'P', b'K', // magic and type
    0x18, 0x00, 0x00, 0x00, // size
    0x04, 0x00, 0x02, 0x00, // width, height
    0x02, 0x04, // format, palette count
    0xff, 0x00, 0x00, 0xff, //
    0x00, 0xff, 0x00, 0xff, //
    0x00, 0x00, 0xff, 0xff, //
    0xff, 0x00, 0xff, 0x00, //
    0x00, 0x6f, // 2-bit packed pixels
];

pub fn golden_bitmap() -> RgbaBitmap {
    RgbaBitmap::from_colours(GOLDEN_WIDTH, GOLDEN_HEIGHT, &GOLDEN_PIXELS).unwrap()
}

/// A 16 colour vertical stripe pattern.
pub fn stripes(width: u32, height: u32) -> RgbaBitmap {
    let pixels: Vec<Colour> = (0..width * height)
        .map(|i| {
            let x = (i % width % 16) as u8;
            Colour::opaque(x * 16, 0, 255 - x)
        })
        .collect();
    RgbaBitmap::from_colours(width, height, &pixels).unwrap()
}

/// A bare `BLIT` block wrapping `code`.
pub fn blit_binary(code: &[u8]) -> Vec<u8> {
    let mut data = b"BLIT".to_vec();
    for entry in [0x9000_0101u32, 0x9000_0201, 0x9000_0301] {
        data.extend_from_slice(&entry.to_le_bytes());
    }
    let length = (BLIT_HEADER_SIZE + code.len()) as u32 | 0x9000_0000;
    data.extend_from_slice(&length.to_le_bytes());
    data.extend_from_slice(code);
    data
}
