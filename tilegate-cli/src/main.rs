//! Tilegate server binary.
//!
//! Resolves configuration from the environment and CLI flags, loads the
//! boundary file, then serves the tile proxy until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tilegate::boundary::{BoundaryError, BoundaryIndex};
use tilegate::cache::TileStore;
use tilegate::config::{Config, ConfigError, ConfigOverrides};
use tilegate::provider::{LinzProvider, ProviderError, ReqwestClient};
use tilegate::server::router;
use tilegate::service::{TileService, TileServiceConfig};

/// Caching tile proxy for the LINZ basemap service.
#[derive(Debug, Parser)]
#[command(name = "tilegate", version, about)]
struct Cli {
    /// Upstream API key (overrides TILEGATE_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Cache directory (overrides TILEGATE_CACHE_DIR).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// GeoJSON boundary file (overrides TILEGATE_BOUNDARY_FILE).
    #[arg(long)]
    boundary_file: Option<PathBuf>,

    /// Listen address (overrides TILEGATE_LISTEN).
    #[arg(long)]
    listen: Option<String>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("boundary error: {0}")]
    Boundary(#[from] BoundaryError),

    #[error("HTTP client error: {0}")]
    Client(#[from] ProviderError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            api_key: cli.api_key,
            cache_dir: cli.cache_dir,
            boundary_file: cli.boundary_file,
            listen: cli.listen,
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = Config::from_env_with(cli.into())?;

    let boundary = BoundaryIndex::from_geojson_file(&config.boundary_file)?;
    info!(
        boundary = %config.boundary_file.display(),
        regions = boundary.region_count(),
        "boundary loaded"
    );

    let client = ReqwestClient::new(config.upstream_timeout)?;
    let service = Arc::new(TileService::new(
        boundary,
        TileStore::new(&config.cache_dir, config.negative_ttl),
        LinzProvider::new(client, config.api_key.clone()),
        TileServiceConfig {
            max_concurrent_fetches: config.max_concurrent_fetches,
        },
    ));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listen,
            source,
        })?;
    info!(
        listen = %config.listen,
        cache_dir = %config.cache_dir.display(),
        "tilegate listening"
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("tilegate: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_map_to_overrides() {
        let cli = Cli::parse_from([
            "tilegate",
            "--api-key",
            "SECRET",
            "--cache-dir",
            "/tmp/tiles",
            "--listen",
            "127.0.0.1:9090",
        ]);
        let overrides = ConfigOverrides::from(cli);

        assert_eq!(overrides.api_key.as_deref(), Some("SECRET"));
        assert_eq!(overrides.cache_dir, Some(PathBuf::from("/tmp/tiles")));
        assert_eq!(overrides.listen.as_deref(), Some("127.0.0.1:9090"));
        assert_eq!(overrides.boundary_file, None);
    }

    #[test]
    fn test_cli_defaults_to_no_overrides() {
        let cli = Cli::parse_from(["tilegate"]);
        let overrides = ConfigOverrides::from(cli);

        assert!(overrides.api_key.is_none());
        assert!(overrides.cache_dir.is_none());
        assert!(overrides.boundary_file.is_none());
        assert!(overrides.listen.is_none());
    }
}
