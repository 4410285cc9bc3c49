use anyhow::{Context, Result};
use std::path::Path;

use super::{CoverImage, CoverSource};

/// MP3 audio file implementation
pub struct Mp3File;

impl CoverSource for Mp3File {
    fn format_name(&self) -> &'static str {
        "mp3"
    }

    fn extract_cover(&self, path: &Path) -> Result<Option<CoverImage>> {
        let tag = id3::Tag::read_from_path(path).context("Failed to read MP3 tags")?;
        let cover = tag.pictures().next().map(|picture| {
            CoverImage::with_default_mime(picture.data.clone(), &picture.mime_type)
        });
        Ok(cover)
    }
}
