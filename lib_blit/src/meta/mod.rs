pub mod decoder;
pub mod encoder;
pub mod format;

pub use decoder::{decode, decode_prefix, DecodeError};
pub use encoder::{encode, EncodingError};
pub use format::MetadataRecord;
