use log::{debug, error, info};
use thiserror::Error;

use super::format::*;
use crate::sprite;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("{field} is {len} characters, the maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field} contains non-ASCII characters")]
    NonAscii { field: &'static str },
    #[error("Too many filetypes: {0} (max 255)")]
    TooManyFiletypes(usize),
    #[error("Metadata body of {0} bytes does not fit the length field")]
    BodyTooLarge(usize),
    #[error("Failed to encode {field}")]
    Sprite {
        field: &'static str,
        #[source]
        source: sprite::EncodingError,
    },
}

/// Writes `value` null-padded to `width` bytes, keeping at least one null.
fn write_text(
    out: &mut Vec<u8>,
    field: &'static str,
    value: &str,
    width: usize,
) -> Result<(), EncodingError> {
    if !value.is_ascii() {
        error!("{} {:?} is not ASCII", field, value);
        return Err(EncodingError::NonAscii { field });
    }
    if value.len() >= width {
        error!("{} {:?} does not fit in {} bytes", field, value, width);
        return Err(EncodingError::FieldTooLong {
            field,
            len: value.len(),
            max: width - 1,
        });
    }

    out.extend_from_slice(value.as_bytes());
    out.resize(out.len() + width - value.len(), 0);
    Ok(())
}

fn encode_sprite(
    out: &mut Vec<u8>,
    field: &'static str,
    sprite: &sprite::SpriteRecord,
) -> Result<(), EncodingError> {
    let encoded = sprite::encode(sprite).map_err(|source| EncodingError::Sprite { field, source })?;
    out.extend_from_slice(&encoded);
    Ok(())
}

pub fn encode(record: &MetadataRecord) -> Result<Vec<u8>, EncodingError> {
    info!("Encoding metadata for {:?}", record.title);

    // Step 1: Body
    let mut body = Vec::new();
    body.extend_from_slice(&record.checksum.to_le_bytes());
    write_text(&mut body, "date", &record.date, DATE_SIZE)?;
    write_text(&mut body, "title", &record.title, TITLE_SIZE)?;
    write_text(&mut body, "description", &record.description, DESCRIPTION_SIZE)?;
    write_text(&mut body, "version", &record.version, VERSION_SIZE)?;
    write_text(&mut body, "author", &record.author, AUTHOR_SIZE)?;
    debug!("Checksum {:#010x} and text fields written", record.checksum);

    body.extend_from_slice(&TYPE_MARKER);
    write_text(&mut body, "category", &record.category, CATEGORY_SIZE)?;
    write_text(&mut body, "url", &record.url, URL_SIZE)?;

    let filetype_count = u8::try_from(record.filetypes.len())
        .map_err(|_| EncodingError::TooManyFiletypes(record.filetypes.len()))?;
    body.push(filetype_count);
    for filetype in &record.filetypes {
        write_text(&mut body, "filetype", filetype, FILETYPE_SIZE)?;
    }
    debug!("Type section written with {} filetypes", filetype_count);

    encode_sprite(&mut body, "icon", &record.icon)?;
    encode_sprite(&mut body, "splash", &record.splash)?;

    // Step 2: Header and length prefix
    let body_length = u16::try_from(body.len()).map_err(|_| {
        error!("Metadata body of {} bytes exceeds 65535", body.len());
        EncodingError::BodyTooLarge(body.len())
    })?;

    let mut encoded_data =
        Vec::with_capacity(MetadataRecord::MAGIC_SIZE + MetadataRecord::LENGTH_SIZE + body.len());
    encoded_data.extend_from_slice(&MAGIC_HEADER);
    encoded_data.extend_from_slice(&body_length.to_le_bytes());
    encoded_data.extend_from_slice(&body);

    info!("Metadata encoded: {} bytes", encoded_data.len());
    Ok(encoded_data)
}

impl MetadataRecord {
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        encode(self)
    }
}
