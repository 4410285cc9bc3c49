use anyhow::{Context, Result};
use mp4ameta::{ImgFmt, Tag};
use std::path::Path;

use super::{CoverImage, CoverSource};

/// M4A (AAC) audio file implementation, also used for `.mp4`
pub struct M4aFile;

impl CoverSource for M4aFile {
    fn format_name(&self) -> &'static str {
        "m4a"
    }

    fn extract_cover(&self, path: &Path) -> Result<Option<CoverImage>> {
        let tag = Tag::read_from_path(path).context("Failed to read M4A tags")?;

        let Some(artwork) = tag.artworks().next() else {
            return Ok(None);
        };
        let mime_type = match artwork.fmt {
            ImgFmt::Jpeg => "image/jpeg",
            ImgFmt::Png => "image/png",
            _ => "application/octet-stream",
        };
        Ok(Some(CoverImage::new(artwork.data.to_vec(), mime_type)))
    }
}
