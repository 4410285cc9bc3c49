use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extensions listed in the catalog
pub const ALLOWED_EXTENSIONS: &[&str] =
    &["mp3", "ogg", "wav", "flac", "m4a", "aac", "opus", "webm"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    /// File name without extension
    pub title: String,
    /// Path relative to the library root, `/`-separated
    pub path: String,
    /// Lowercased extension without the dot
    pub ext: String,
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub mtime: i64,
}

#[derive(Clone)]
pub struct MusicLibrary {
    library_path: PathBuf,
}

impl MusicLibrary {
    pub fn new(library_path: PathBuf) -> Self {
        Self { library_path }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Walk the library folder and list every audio file, sorted by title
    pub fn scan(&self) -> Vec<Track> {
        tracing::debug!("Scanning library at: {}", self.library_path.display());

        let mut tracks: Vec<Track> = WalkDir::new(&self.library_path)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.track_from_entry(&entry))
            .collect();

        tracks.sort_by_cached_key(|track| (track.title.to_lowercase(), track.path.clone()));

        tracing::debug!("Found {} tracks", tracks.len());
        tracks
    }

    fn track_from_entry(&self, entry: &DirEntry) -> Option<Track> {
        let path = entry.path();
        let ext = path.extension()?.to_str()?.to_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }

        let title = path.file_stem()?.to_str()?.to_string();
        let relative = path.strip_prefix(&self.library_path).ok()?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?
            .join("/");

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };
        let mtime = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp())
            .unwrap_or_default();

        Some(Track {
            title,
            path: relative,
            ext,
            size: metadata.len(),
            mtime,
        })
    }

    /// Resolve a client-supplied relative path to a file inside the library.
    ///
    /// The canonical target must lie strictly below the canonical root and be
    /// a regular file; anything else (absolute paths, `..` escapes, symlinks
    /// leading outside, directories, missing files) resolves to `None`.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        if candidate
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        {
            tracing::debug!("Rejected absolute path: {}", relative);
            return None;
        }

        let root = self.library_path.canonicalize().ok()?;
        let resolved = root.join(candidate).canonicalize().ok()?;

        if resolved == root || !resolved.starts_with(&root) {
            tracing::debug!("Rejected path outside the library: {}", relative);
            return None;
        }
        if !resolved.is_file() {
            return None;
        }

        Some(resolved)
    }
}
