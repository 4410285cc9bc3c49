use anyhow::{Context, Result};
use clap::Parser;
use music_shelf::config::Config;
use music_shelf::library::MusicLibrary;
use music_shelf::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default info level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    let config = Config::parse();
    config.ensure_directories()?;

    tracing::info!("Starting Music Shelf");
    tracing::info!("Songs path: {}", config.songs_dir.display());
    tracing::info!("Site path: {}", config.site_dir.display());

    let library = MusicLibrary::new(config.songs_dir.clone());
    let app = server::create_router(library, config.site_dir.clone(), config.url_prefix());
    let addr = config.bind_address();

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /              - Web player");
    tracing::info!("  GET  /api/songs     - List all songs");
    tracing::info!("  GET  /songs/*path   - Stream song audio");
    tracing::info!("  GET  /cover/*path   - Embedded cover art");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
