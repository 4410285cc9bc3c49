use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::path::{Path as FsPath, PathBuf};
use std::time::UNIX_EPOCH;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::audio;
use crate::library::{MusicLibrary, Track};

/// Browsers may keep a cover for a day
pub const COVER_CACHE_CONTROL: &str = "public, max-age=86400";

/// Audio types sent for `/songs/*`, ahead of the generic extension guess
const AUDIO_MIME_TYPES: &[(&str, &str)] = &[
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("webm", "audio/webm"),
];

#[derive(Clone)]
pub struct AppState {
    pub library: MusicLibrary,
    pub site_dir: PathBuf,
    pub url_prefix: String,
}

/// One song in the `/api/songs` listing
#[derive(Debug, Clone, Serialize)]
pub struct SongEntry {
    pub title: String,
    pub url: String,
    pub cover: String,
    pub ext: String,
    pub path: String,
    pub size: u64,
    pub mtime: i64,
}

impl SongEntry {
    pub fn new(track: Track, url_prefix: &str) -> Self {
        let encoded = encode_path(&track.path);
        SongEntry {
            url: format!("{}/songs/{}", url_prefix, encoded),
            cover: format!("{}/cover/{}", url_prefix, encoded),
            title: track.title,
            ext: track.ext,
            path: track.path,
            size: track.size,
            mtime: track.mtime,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SongListing {
    pub count: usize,
    pub songs: Vec<SongEntry>,
}

/// Percent-encode each segment of a `/`-separated relative path
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

pub fn create_router(library: MusicLibrary, site_dir: PathBuf, url_prefix: &str) -> Router {
    // Serve front-end assets from the site directory
    let static_service = ServeDir::new(&site_dir);

    let state = AppState {
        library,
        site_dir,
        url_prefix: url_prefix.trim_end_matches('/').to_string(),
    };

    Router::new()
        .route("/", get(index))
        .route("/api/songs", get(list_songs))
        .route("/songs/*path", get(stream_song))
        .route("/cover/*path", get(get_cover))
        .route("/favicon.ico", get(favicon))
        .nest_service("/static", static_service)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Front-end entry document
async fn index(State(state): State<AppState>, request: Request) -> Response {
    serve_file(state.site_dir.join("index.html"), request).await
}

async fn favicon(State(state): State<AppState>, request: Request) -> Response {
    serve_file(state.site_dir.join("favicon.ico"), request).await
}

/// List all songs
async fn list_songs(State(state): State<AppState>) -> Result<Json<SongListing>, StatusCode> {
    tracing::debug!("Fetching song listing");

    let library = state.library.clone();
    let tracks = tokio::task::spawn_blocking(move || library.scan())
        .await
        .map_err(|e| {
            tracing::error!("Library scan failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let songs: Vec<SongEntry> = tracks
        .into_iter()
        .map(|track| SongEntry::new(track, &state.url_prefix))
        .collect();

    tracing::debug!("Returning {} songs", songs.len());
    Ok(Json(SongListing {
        count: songs.len(),
        songs,
    }))
}

/// Stream an audio file with Range and conditional request support
async fn stream_song(
    State(state): State<AppState>,
    Path(path): Path<String>,
    mut request: Request,
) -> Response {
    tracing::debug!("Streaming song: {}", path);

    let library = state.library.clone();
    let resolved = tokio::task::spawn_blocking(move || library.resolve(&path))
        .await
        .ok()
        .flatten();

    let Some(file) = resolved else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let etag = tokio::fs::metadata(&file)
        .await
        .ok()
        .and_then(|metadata| entity_tag(&metadata));

    if let Some(if_none_match) = request.headers_mut().remove(header::IF_NONE_MATCH) {
        // If-None-Match takes precedence over If-Modified-Since
        request.headers_mut().remove(header::IF_MODIFIED_SINCE);
        if let Some(etag) = etag.as_deref().filter(|etag| etag_matches(&if_none_match, etag)) {
            tracing::debug!("ETag {} still current for {}", etag, file.display());
            return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag.to_string())]).into_response();
        }
    }

    let mime_type = audio_mime_type(&file);
    let mut response = serve_file(file, request).await;
    if response.status().is_success() {
        let headers = response.headers_mut();
        if let Some(etag) = etag.and_then(|etag| HeaderValue::from_str(&etag).ok()) {
            headers.insert(header::ETAG, etag);
        }
        if let Some(mime_type) = mime_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime_type));
        }
    }
    response
}

fn audio_mime_type(path: &FsPath) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    AUDIO_MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime_type)| *mime_type)
}

/// Validator built from modification time and size
fn entity_tag(metadata: &std::fs::Metadata) -> Option<String> {
    let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some(format!("\"{:x}-{:x}\"", modified.as_micros(), metadata.len()))
}

/// Weak comparison against an `If-None-Match` list
fn etag_matches(if_none_match: &HeaderValue, etag: &str) -> bool {
    let Ok(candidates) = if_none_match.to_str() else {
        return false;
    };
    candidates
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

/// Get embedded cover art for a song
async fn get_cover(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, StatusCode> {
    tracing::debug!("Fetching cover art for: {}", path);

    let library = state.library.clone();
    let cover = tokio::task::spawn_blocking(move || {
        library
            .resolve(&path)
            .and_then(|file| audio::extract_cover(&file))
    })
    .await
    .map_err(|e| {
        tracing::warn!("Cover extraction task failed: {}", e);
        StatusCode::NOT_FOUND
    })?;

    let Some(cover) = cover else {
        tracing::debug!("No cover art available");
        return Err(StatusCode::NOT_FOUND);
    };

    let content_type = HeaderValue::from_str(&cover.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(COVER_CACHE_CONTROL),
            ),
        ],
        cover.data,
    )
        .into_response())
}

async fn serve_file(path: PathBuf, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
