//! Music Shelf - serve a folder of audio files over HTTP
//!
//! This library provides the song catalog, the traversal-safe path resolver,
//! embedded cover art extraction for MP3, FLAC, MP4, Ogg Vorbis and Ogg Opus,
//! and the HTTP router tying them together.

pub mod audio;
pub mod config;
pub mod library;
pub mod server;
