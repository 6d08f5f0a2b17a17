//! Little-endian cursor over record bytes.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
pub struct UnexpectedEof {
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], UnexpectedEof> {
        let available = self.remaining();
        if len > available {
            return Err(UnexpectedEof {
                offset: self.cursor,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(bytes)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], UnexpectedEof> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, UnexpectedEof> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, UnexpectedEof> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, UnexpectedEof> {
        self.array().map(u32::from_le_bytes)
    }

    /// Looks at the next bytes without consuming them.
    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        self.data.get(self.cursor..self.cursor + len)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.cursor..];
        self.cursor = self.data.len();
        rest
    }
}
