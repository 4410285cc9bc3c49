//! FLAC picture blocks, as stored natively in FLAC metadata and as the
//! base64 `METADATA_BLOCK_PICTURE` Vorbis comment.
//!
//! Layout, every integer a big-endian u32:
//! picture type, MIME length, MIME, description length, description,
//! width, height, color depth, indexed colors, data length, data.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

use super::CoverImage;

/// Vorbis comment key holding a base64 picture block
pub const METADATA_BLOCK_PICTURE: &str = "METADATA_BLOCK_PICTURE";

/// Standard alphabet, lenient about padding and trailing bits on decode
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug)]
pub enum PictureError {
    #[error("Picture block truncated at {field}: needed {needed} bytes, {remaining} left")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureBlock {
    pub picture_type: u32,
    pub mime_type: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub colors: u32,
    pub data: Vec<u8>,
}

impl PictureBlock {
    /// A front cover with no dimensions recorded
    pub fn front_cover(mime_type: &str, data: Vec<u8>) -> Self {
        PictureBlock {
            picture_type: 3,
            mime_type: mime_type.to_string(),
            description: String::new(),
            width: 0,
            height: 0,
            depth: 0,
            colors: 0,
            data,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, PictureError> {
        let mut reader = BlockReader { buf: bytes };

        let picture_type = reader.read_u32("picture type")?;
        let mime_type = String::from_utf8_lossy(reader.read_chunk("MIME type")?).into_owned();
        let description = String::from_utf8_lossy(reader.read_chunk("description")?).into_owned();
        let width = reader.read_u32("width")?;
        let height = reader.read_u32("height")?;
        let depth = reader.read_u32("color depth")?;
        let colors = reader.read_u32("color count")?;
        let data = reader.read_chunk("picture data")?.to_vec();

        Ok(PictureBlock {
            picture_type,
            mime_type,
            description,
            width,
            height,
            depth,
            colors,
            data,
        })
    }

    /// Decode the base64 form used in Vorbis comments
    pub fn from_base64(encoded: &str) -> Result<Self, PictureError> {
        Self::parse(&decode_base64(encoded)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mime = self.mime_type.as_bytes();
        let description = self.description.as_bytes();
        let mut out = Vec::with_capacity(32 + mime.len() + description.len() + self.data.len());

        out.extend_from_slice(&self.picture_type.to_be_bytes());
        out.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        out.extend_from_slice(mime);
        out.extend_from_slice(&(description.len() as u32).to_be_bytes());
        out.extend_from_slice(description);
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.depth.to_be_bytes());
        out.extend_from_slice(&self.colors.to_be_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn into_cover(self) -> CoverImage {
        CoverImage::with_default_mime(self.data, &self.mime_type)
    }
}

/// Decode a base64 comment value, ignoring embedded whitespace
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, PictureError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(BASE64.decode(compact)?)
}

struct BlockReader<'a> {
    buf: &'a [u8],
}

impl<'a> BlockReader<'a> {
    fn take(&mut self, needed: usize, field: &'static str) -> Result<&'a [u8], PictureError> {
        if needed > self.buf.len() {
            return Err(PictureError::Truncated {
                field,
                needed,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(needed);
        self.buf = tail;
        Ok(head)
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, PictureError> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_chunk(&mut self, field: &'static str) -> Result<&'a [u8], PictureError> {
        let len = self.read_u32(field)? as usize;
        self.take(len, field)
    }
}
