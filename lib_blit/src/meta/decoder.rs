use log::{debug, error, info};
use thiserror::Error;

use super::format::*;
use crate::sprite;
use crate::wire::{ByteReader, UnexpectedEof};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid format or header")]
    InvalidHeader,
    #[error("Missing BLITTYPE marker")]
    MissingTypeMarker,
    #[error("{field} is not valid ASCII")]
    InvalidText { field: &'static str },
    #[error("Metadata is truncated")]
    Truncated(#[from] UnexpectedEof),
    #[error("Metadata body has {0} unexpected bytes after the splash")]
    TrailingBody(usize),
    #[error("Record is followed by {0} unexpected bytes")]
    TrailingData(usize),
    #[error("Failed to decode {field}")]
    Sprite {
        field: &'static str,
        #[source]
        source: sprite::DecodeError,
    },
}

fn read_text(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    width: usize,
) -> Result<String, DecodeError> {
    let bytes = reader.take(width)?;
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let text = &bytes[..end];

    if !text.is_ascii() {
        error!("{} is not ASCII: {:?}", field, text);
        return Err(DecodeError::InvalidText { field });
    }
    // ASCII is always valid UTF-8
    Ok(text.iter().map(|&b| b as char).collect())
}

fn read_sprite(
    reader: &mut ByteReader<'_>,
    field: &'static str,
) -> Result<sprite::SpriteRecord, DecodeError> {
    let data = reader.peek(reader.remaining()).unwrap_or_default();
    let (record, consumed) =
        sprite::decode_prefix(data).map_err(|source| DecodeError::Sprite { field, source })?;
    reader.take(consumed)?;
    debug!(
        "{} decoded: {}x{} ({} colours)",
        field,
        record.width,
        record.height,
        record.palette.len()
    );
    Ok(record)
}

/// Decodes metadata that must span all of `encoded_data`.
///
/// The checksum is returned as stored and is not verified.
pub fn decode(encoded_data: &[u8]) -> Result<MetadataRecord, DecodeError> {
    let (record, consumed) = decode_prefix(encoded_data)?;
    if consumed != encoded_data.len() {
        return Err(DecodeError::TrailingData(encoded_data.len() - consumed));
    }
    Ok(record)
}

/// Decodes metadata from the start of `encoded_data`, returning it with the
/// number of bytes it occupied.
pub fn decode_prefix(encoded_data: &[u8]) -> Result<(MetadataRecord, usize), DecodeError> {
    let mut reader = ByteReader::new(encoded_data);

    if reader.peek(MetadataRecord::MAGIC_SIZE) != Some(&MAGIC_HEADER[..]) {
        error!("Invalid format or missing magic number in metadata header");
        return Err(DecodeError::InvalidHeader);
    }
    reader.take(MetadataRecord::MAGIC_SIZE)?;

    let body_length = reader.u16()? as usize;
    let mut body = ByteReader::new(reader.take(body_length)?);
    debug!("Metadata body length: {}", body_length);

    let checksum = body.u32()?;
    let date = read_text(&mut body, "date", DATE_SIZE)?;
    let title = read_text(&mut body, "title", TITLE_SIZE)?;
    let description = read_text(&mut body, "description", DESCRIPTION_SIZE)?;
    let version = read_text(&mut body, "version", VERSION_SIZE)?;
    let author = read_text(&mut body, "author", AUTHOR_SIZE)?;

    if body.array::<8>()? != TYPE_MARKER {
        error!("Metadata is missing the BLITTYPE marker");
        return Err(DecodeError::MissingTypeMarker);
    }
    let category = read_text(&mut body, "category", CATEGORY_SIZE)?;
    let url = read_text(&mut body, "url", URL_SIZE)?;

    let filetype_count = body.u8()?;
    let filetypes = (0..filetype_count)
        .map(|_| read_text(&mut body, "filetype", FILETYPE_SIZE))
        .collect::<Result<Vec<_>, _>>()?;

    let icon = read_sprite(&mut body, "icon")?;
    let splash = read_sprite(&mut body, "splash")?;

    if body.remaining() != 0 {
        error!("{} bytes left in metadata body", body.remaining());
        return Err(DecodeError::TrailingBody(body.remaining()));
    }

    info!("Decoded metadata for {:?} {}", title, version);
    Ok((
        MetadataRecord {
            checksum,
            date,
            title,
            description,
            version,
            author,
            category,
            url,
            filetypes,
            icon,
            splash,
        },
        reader.position(),
    ))
}

impl MetadataRecord {
    pub fn decode(encoded_data: &[u8]) -> Result<Self, DecodeError> {
        decode(encoded_data)
    }
}
