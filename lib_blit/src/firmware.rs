//! The `.blit` firmware container: an optional relocation table, the game
//! binary, and optional trailing metadata.

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::meta::{self, MetadataRecord};
use crate::wire::{ByteReader, UnexpectedEof};

pub const RELO_HEADER: [u8; 4] = *b"RELO";
pub const BLIT_HEADER: [u8; 4] = *b"BLIT";

/// The length field holds the flash end address; only the low 28 bits are a length.
pub const LENGTH_MASK: u32 = 0x0FFF_FFFF;
/// Header, three entry points and the length field itself.
pub const BLIT_HEADER_SIZE: usize = 20;

#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("Invalid firmware: missing BLIT header")]
    InvalidHeader,
    #[error("Invalid firmware: length field {0:#010x} is shorter than the BLIT header")]
    InvalidLength(u32),
    #[error("Firmware is truncated")]
    Truncated(#[from] UnexpectedEof),
    #[error("Failed to encode firmware metadata")]
    MetadataEncoding(#[from] meta::EncodingError),
}

/// The `BLIT` block: entry points, flagged length and the code that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlitBinary {
    pub render: u32,
    pub update: u32,
    pub init: u32,
    pub length: u32,
    pub code: Vec<u8>,
}

impl BlitBinary {
    /// The exact bytes of the block, header included. This is what the
    /// metadata checksum covers.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BLIT_HEADER_SIZE + self.code.len());
        out.extend_from_slice(&BLIT_HEADER);
        for field in [self.render, self.update, self.init, self.length] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&self.code);
        out
    }

    /// Length of the whole block with the flag nibble masked out.
    pub fn binary_size(&self) -> u32 {
        self.length & LENGTH_MASK
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, FirmwareError> {
        if reader.peek(BLIT_HEADER.len()) != Some(&BLIT_HEADER[..]) {
            error!("Missing BLIT header at offset {}", reader.position());
            return Err(FirmwareError::InvalidHeader);
        }
        reader.take(BLIT_HEADER.len())?;

        let render = reader.u32()?;
        let update = reader.u32()?;
        let init = reader.u32()?;
        let length = reader.u32()?;

        let code_len = ((length & LENGTH_MASK) as usize)
            .checked_sub(BLIT_HEADER_SIZE)
            .ok_or_else(|| {
                error!("BLIT length {:#010x} is shorter than its header", length);
                FirmwareError::InvalidLength(length)
            })?;
        let code = reader.take(code_len)?.to_vec();
        debug!("BLIT block: {} bytes of code", code.len());

        Ok(Self {
            render,
            update,
            init,
            length,
            code,
        })
    }
}

fn ignore_trailing(bytes: usize) {
    if bytes > 0 {
        warn!("Ignoring {} trailing bytes after the firmware", bytes);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    pub relocs: Option<Vec<u32>>,
    pub binary: BlitBinary,
    pub metadata: Option<MetadataRecord>,
}

impl Firmware {
    pub fn parse(data: &[u8]) -> Result<Self, FirmwareError> {
        info!("Parsing {} byte firmware", data.len());
        let mut reader = ByteReader::new(data);

        let relocs = if reader.peek(RELO_HEADER.len()) == Some(&RELO_HEADER[..]) {
            reader.take(RELO_HEADER.len())?;
            let count = reader.u32()? as usize;
            if count > reader.remaining() / 4 {
                error!("Relocation table claims {} entries", count);
                return Err(UnexpectedEof {
                    offset: reader.position(),
                    needed: count * 4,
                    available: reader.remaining(),
                }
                .into());
            }
            let relocs = (0..count)
                .map(|_| reader.u32())
                .collect::<Result<Vec<_>, _>>()?;
            debug!("Read {} relocations", relocs.len());
            Some(relocs)
        } else {
            None
        };

        let binary = BlitBinary::read(&mut reader)?;

        let metadata = match reader.peek(MetadataRecord::MAGIC_SIZE) {
            Some(header) if header == meta::format::MAGIC_HEADER => {
                let rest = reader.rest();
                match meta::decode_prefix(rest) {
                    Ok((record, consumed)) => {
                        debug!("Read {} bytes of metadata", consumed);
                        ignore_trailing(rest.len() - consumed);
                        Some(record)
                    }
                    // A damaged record still leaves a usable binary
                    Err(e) => {
                        warn!("Ignoring unreadable metadata: {}", e);
                        None
                    }
                }
            }
            _ => {
                ignore_trailing(reader.remaining());
                None
            }
        };

        Ok(Self {
            relocs,
            binary,
            metadata,
        })
    }

    /// CRC32 of the `BLIT` block, as stored in a metadata record's checksum.
    pub fn checksum(&self) -> u32 {
        MetadataRecord::checksum_of(&self.binary.to_bytes())
    }

    /// Replaces the metadata, binding its checksum to this binary.
    pub fn set_metadata(&mut self, mut metadata: MetadataRecord) {
        metadata.bind_to(&self.binary.to_bytes());
        self.metadata = Some(metadata);
    }

    pub fn encode(&self) -> Result<Vec<u8>, FirmwareError> {
        let mut out = Vec::new();

        if let Some(relocs) = &self.relocs {
            out.extend_from_slice(&RELO_HEADER);
            out.extend_from_slice(&(relocs.len() as u32).to_le_bytes());
            for reloc in relocs {
                out.extend_from_slice(&reloc.to_le_bytes());
            }
        }

        out.extend_from_slice(&self.binary.to_bytes());

        if let Some(metadata) = &self.metadata {
            out.extend_from_slice(&metadata.encode()?);
        }

        info!("Encoded {} byte firmware", out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blit(code: &[u8], flags: u32) -> Vec<u8> {
        let mut data = b"BLIT".to_vec();
        for entry in [0x9000_0100u32, 0x9000_0200, 0x9000_0300] {
            data.extend_from_slice(&entry.to_le_bytes());
        }
        let length = (BLIT_HEADER_SIZE + code.len()) as u32 | flags;
        data.extend_from_slice(&length.to_le_bytes());
        data.extend_from_slice(code);
        data
    }

    #[test]
    fn test_parse_bare_binary() {
        let data = blit(&[1, 2, 3, 4], 0x9000_0000);
        let firmware = Firmware::parse(&data).unwrap();
        assert_eq!(firmware.relocs, None);
        assert_eq!(firmware.metadata, None);
        assert_eq!(firmware.binary.code, vec![1, 2, 3, 4]);
        assert_eq!(firmware.binary.binary_size(), 24);
        assert_eq!(firmware.binary.update, 0x9000_0200);
        assert_eq!(firmware.encode().unwrap(), data);
        assert_eq!(firmware.checksum(), crc32fast::hash(&data));
    }

    #[test]
    fn test_parse_empty_code() {
        let data = b"BLIT000000000000\x14\x00\x00\x00";
        let firmware = Firmware::parse(data).unwrap();
        assert!(firmware.binary.code.is_empty());
    }

    #[test]
    fn test_parse_relocations() {
        let mut data = b"RELO".to_vec();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0x10u32.to_le_bytes());
        data.extend_from_slice(&0x20u32.to_le_bytes());
        data.extend_from_slice(&blit(&[9; 8], 0));

        let firmware = Firmware::parse(&data).unwrap();
        assert_eq!(firmware.relocs, Some(vec![0x10, 0x20]));
        assert_eq!(firmware.binary.code, vec![9; 8]);
        assert_eq!(firmware.encode().unwrap(), data);
        // The checksum only covers the BLIT block
        assert_eq!(firmware.checksum(), crc32fast::hash(&data[16..]));
    }

    #[test]
    fn test_parse_corrupt_metadata() {
        let binary = blit(&[1, 2, 3, 4], 0);
        let mut data = binary.clone();
        data.extend_from_slice(b"BLITMETA\x40\x00truncated");

        let firmware = Firmware::parse(&data).unwrap();
        assert_eq!(firmware.metadata, None);
        assert_eq!(firmware.binary.code, vec![1, 2, 3, 4]);
        assert_eq!(firmware.encode().unwrap(), binary);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Firmware::parse(b"BLIT000000000000\x10\x00\x00\x00"),
            Err(FirmwareError::InvalidLength(0x10))
        ));
        assert!(matches!(
            Firmware::parse(b"ELF\x7f"),
            Err(FirmwareError::InvalidHeader)
        ));
        assert!(matches!(
            Firmware::parse(&blit(&[1, 2, 3], 0)[..22]),
            Err(FirmwareError::Truncated(_))
        ));

        let mut relo = b"RELO".to_vec();
        relo.extend_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            Firmware::parse(&relo),
            Err(FirmwareError::Truncated(_))
        ));
    }
}
