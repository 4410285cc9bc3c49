use anyhow::{Context, Result};
use std::path::Path;

use super::picture::{METADATA_BLOCK_PICTURE, PictureBlock};
use super::{CoverImage, CoverSource};

/// FLAC audio file implementation
pub struct FlacFile;

impl CoverSource for FlacFile {
    fn format_name(&self) -> &'static str {
        "flac"
    }

    fn extract_cover(&self, path: &Path) -> Result<Option<CoverImage>> {
        let tag = metaflac::Tag::read_from_path(path).context("Failed to read FLAC tags")?;

        if let Some(picture) = tag.pictures().next() {
            return Ok(Some(CoverImage::with_default_mime(
                picture.data.clone(),
                &picture.mime_type,
            )));
        }

        // Older taggers store the picture block as a base64 Vorbis comment
        let Some(encoded) = tag.vorbis_comments().and_then(legacy_picture) else {
            return Ok(None);
        };
        let block = PictureBlock::from_base64(encoded)
            .context("Malformed METADATA_BLOCK_PICTURE comment")?;
        Ok(Some(block.into_cover()))
    }
}

fn legacy_picture(comments: &metaflac::block::VorbisComment) -> Option<&str> {
    comments
        .comments
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(METADATA_BLOCK_PICTURE))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}
