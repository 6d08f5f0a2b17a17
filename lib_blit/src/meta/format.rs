use crate::sprite::SpriteRecord;

pub const MAGIC_HEADER: [u8; 8] = *b"BLITMETA";
/// Marks the start of the category/url/filetype section.
pub const TYPE_MARKER: [u8; 8] = *b"BLITTYPE";

pub const DATE_SIZE: usize = 16;
pub const TITLE_SIZE: usize = 25;
pub const DESCRIPTION_SIZE: usize = 129;
pub const VERSION_SIZE: usize = 17;
pub const AUTHOR_SIZE: usize = 17;
pub const CATEGORY_SIZE: usize = 17;
pub const URL_SIZE: usize = 129;
pub const FILETYPE_SIZE: usize = 5;

/// Game metadata appended to a firmware image.
///
/// `checksum` is the CRC32 of the firmware's binary section, which ties a
/// record to the one build it describes. Text fields are stored as
/// null-padded ASCII of fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub checksum: u32,
    pub date: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub category: String,
    pub url: String,
    pub filetypes: Vec<String>,
    pub icon: SpriteRecord,
    pub splash: SpriteRecord,
}

impl MetadataRecord {
    pub const MAGIC_SIZE: usize = MAGIC_HEADER.len();
    pub const LENGTH_SIZE: usize = std::mem::size_of::<u16>();

    /// CRC32 of a binary section, as stored in `checksum`.
    pub fn checksum_of(binary: &[u8]) -> u32 {
        crc32fast::hash(binary)
    }

    /// Recomputes the checksum for `binary`, binding this record to it.
    pub fn bind_to(&mut self, binary: &[u8]) {
        self.checksum = Self::checksum_of(binary);
    }

    /// Checks the stored checksum against `binary`.
    ///
    /// Decoding never calls this; records read from a device arrive without
    /// their binary.
    pub fn verify_checksum(&self, binary: &[u8]) -> bool {
        self.checksum == Self::checksum_of(binary)
    }
}
