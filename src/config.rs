use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "music-shelf")]
#[command(about = "Serve a folder of audio files over HTTP", long_about = None)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4080)]
    pub port: u16,

    /// Folder holding the audio files
    #[arg(long, env = "SONGS_DIR", default_value = "songs")]
    pub songs_dir: PathBuf,

    /// Folder holding the web front-end
    #[arg(long, env = "SITE_DIR", default_value = "site")]
    pub site_dir: PathBuf,

    /// Prefix for links in the song listing, when mounted behind a proxy
    #[arg(long, env = "URL_PREFIX", default_value_t = String::new())]
    pub url_prefix: String,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url_prefix(&self) -> &str {
        self.url_prefix.trim_end_matches('/')
    }

    /// Create the songs and site folders if they are missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.songs_dir, &self.site_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
