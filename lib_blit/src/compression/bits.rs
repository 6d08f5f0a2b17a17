//! MSB-first bit stream helpers shared by the packed and run-length encoders.

/// Accumulates fixed-width fields, most significant bit first.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `width` bits of `value`.
    pub fn write(&mut self, value: u32, width: u8) {
        for shift in (0..width).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.used == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> self.used;
            }
        }
        self.used = (self.used + 1) % 8;
    }

    /// Returns the stream with the final byte zero-padded.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads fixed-width fields back out of a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Reads `width` bits, or `None` once the stream is exhausted.
    pub fn read(&mut self, width: u8) -> Option<u32> {
        if self.remaining() < width as usize {
            return None;
        }
        let mut value = 0;
        for _ in 0..width {
            value = (value << 1) | self.read_bit()? as u32;
        }
        Some(value)
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        let byte = self.data.get(self.position / 8)?;
        let bit = byte & (0x80 >> (self.position % 8)) != 0;
        self.position += 1;
        Some(bit)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }
}
