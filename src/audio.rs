pub mod flac;
pub mod mp3;
pub mod mp4;
pub mod ogg;
pub mod picture;

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// MIME type reported when a tag declares a picture without one
pub const DEFAULT_COVER_MIME: &str = "image/jpeg";

/// Cover art extracted from an audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl CoverImage {
    pub fn new(data: Vec<u8>, mime_type: &str) -> Self {
        CoverImage {
            data,
            mime_type: mime_type.to_string(),
        }
    }

    /// Like `new`, but an empty MIME type falls back to `image/jpeg`
    pub fn with_default_mime(data: Vec<u8>, mime_type: &str) -> Self {
        let mime_type = mime_type.trim();
        if mime_type.is_empty() {
            Self::new(data, DEFAULT_COVER_MIME)
        } else {
            Self::new(data, mime_type)
        }
    }
}

/// Container format, decided by file extension only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Mp4,
    OggVorbis,
    OggOpus,
    Unsupported,
}

impl AudioFormat {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "m4a" | "mp4" => AudioFormat::Mp4,
            "ogg" => AudioFormat::OggVorbis,
            "opus" => AudioFormat::OggOpus,
            _ => AudioFormat::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_extension)
            .unwrap_or(AudioFormat::Unsupported)
    }
}

/// A format-specific reader of embedded cover art
pub trait CoverSource: Send + Sync {
    /// Get the file format name (e.g., "flac", "mp3")
    fn format_name(&self) -> &'static str;

    /// Read the first embedded picture.
    ///
    /// `Ok(None)` means the tags were readable but carry no picture; `Err`
    /// means the container or tag data could not be parsed.
    fn extract_cover(&self, path: &Path) -> Result<Option<CoverImage>>;
}

/// Pick the cover reader for a format
pub fn get_cover_source(format: AudioFormat) -> Option<Box<dyn CoverSource>> {
    match format {
        AudioFormat::Mp3 => Some(Box::new(mp3::Mp3File)),
        AudioFormat::Flac => Some(Box::new(flac::FlacFile)),
        AudioFormat::Mp4 => Some(Box::new(mp4::M4aFile)),
        AudioFormat::OggVorbis => Some(Box::new(ogg::OggFile::vorbis())),
        AudioFormat::OggOpus => Some(Box::new(ogg::OggFile::opus())),
        AudioFormat::Unsupported => None,
    }
}

/// Extract cover art from a file, treating every parse failure as "no cover"
pub fn extract_cover(path: &Path) -> Option<CoverImage> {
    let format = AudioFormat::from_path(path);
    let Some(source) = get_cover_source(format) else {
        tracing::debug!("No cover reader for {}", path.display());
        return None;
    };

    // Tag crates may panic on hostile input; that counts as a parse failure too
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.extract_cover(path)))
        .unwrap_or_else(|_| Err(anyhow::anyhow!("Tag reader panicked")));

    match outcome {
        Ok(Some(cover)) => {
            tracing::debug!(
                "Found {} cover in {} ({} bytes, {})",
                source.format_name(),
                path.display(),
                cover.data.len(),
                cover.mime_type
            );
            Some(cover)
        }
        Ok(None) => {
            tracing::debug!("No embedded cover in {}", path.display());
            None
        }
        Err(e) => {
            tracing::debug!(
                "Failed to read {} cover from {}: {:#}",
                source.format_name(),
                path.display(),
                e
            );
            None
        }
    }
}
