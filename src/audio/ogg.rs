use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::codecs::{CODEC_TYPE_OPUS, CODEC_TYPE_VORBIS, CodecType};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;

use super::picture::{self, METADATA_BLOCK_PICTURE, PictureBlock};
use super::{CoverImage, CoverSource, DEFAULT_COVER_MIME};

/// Legacy comment holding raw base64 image bytes
pub const COVERART: &str = "COVERART";
/// MIME type accompanying `COVERART`
pub const COVERART_MIME: &str = "COVERARTMIME";

/// Codecs whose comment header carries a Vorbis comment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OggCodec {
    Vorbis,
    Opus,
}

impl OggCodec {
    /// Order in which codecs are looked for, for `.ogg` and `.opus` alike
    pub const ATTEMPT_ORDER: [OggCodec; 2] = [OggCodec::Vorbis, OggCodec::Opus];

    pub fn name(&self) -> &'static str {
        match self {
            OggCodec::Vorbis => "Vorbis",
            OggCodec::Opus => "Opus",
        }
    }

    fn codec_type(&self) -> CodecType {
        match self {
            OggCodec::Vorbis => CODEC_TYPE_VORBIS,
            OggCodec::Opus => CODEC_TYPE_OPUS,
        }
    }
}

/// Ogg Vorbis / Ogg Opus cover reader.
///
/// Both extensions accept either codec; a Vorbis stream wins over an Opus
/// stream in the same file.
pub struct OggFile {
    format_name: &'static str,
}

impl OggFile {
    pub fn vorbis() -> Self {
        OggFile { format_name: "ogg" }
    }

    pub fn opus() -> Self {
        OggFile {
            format_name: "opus",
        }
    }
}

impl CoverSource for OggFile {
    fn format_name(&self) -> &'static str {
        self.format_name
    }

    fn extract_cover(&self, path: &Path) -> Result<Option<CoverImage>> {
        let file = std::fs::File::open(path).context("Failed to open Ogg file")?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Failed to probe Ogg file")?;

        let mut format = probed.format;
        let mut metadata = probed.metadata;

        let codec = OggCodec::ATTEMPT_ORDER
            .into_iter()
            .find(|codec| {
                format
                    .tracks()
                    .iter()
                    .any(|track| track.codec_params.codec == codec.codec_type())
            })
            .context("No Vorbis or Opus stream")?;
        tracing::debug!("Reading Ogg {} comments from {}", codec.name(), path.display());

        let revision = format
            .metadata()
            .current()
            .cloned()
            .or_else(|| metadata.get().and_then(|m| m.current().cloned()));

        match revision {
            Some(revision) => cover_from_revision(&revision),
            None => Ok(None),
        }
    }
}

/// First value of a comment, matched case-insensitively
fn comment(revision: &MetadataRevision, key: &str) -> Option<String> {
    revision
        .tags()
        .iter()
        .find(|tag| tag.key.eq_ignore_ascii_case(key))
        .map(|tag| tag.value.to_string())
}

/// Cover art from `COVERART`, else from `METADATA_BLOCK_PICTURE`.
///
/// The picture block may arrive either as a raw comment or already decoded
/// into a visual.
pub fn cover_from_revision(revision: &MetadataRevision) -> Result<Option<CoverImage>> {
    if let Some(encoded) = comment(revision, COVERART) {
        let data = picture::decode_base64(&encoded).context("Malformed COVERART comment")?;
        let mime = comment(revision, COVERART_MIME);
        let mime = mime.as_deref().unwrap_or(DEFAULT_COVER_MIME);
        return Ok(Some(CoverImage::with_default_mime(data, mime)));
    }

    if let Some(encoded) = comment(revision, METADATA_BLOCK_PICTURE) {
        let block = PictureBlock::from_base64(&encoded)
            .context("Malformed METADATA_BLOCK_PICTURE comment")?;
        return Ok(Some(block.into_cover()));
    }

    let cover = revision
        .visuals()
        .first()
        .map(|visual| CoverImage::with_default_mime(visual.data.to_vec(), &visual.media_type));
    Ok(cover)
}
