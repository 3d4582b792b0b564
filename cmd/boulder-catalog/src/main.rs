//! # boulder-catalog
//!
//! Assembles the catalogue from configuration and serves it.

#[cfg(not(all(feature = "web-axum", feature = "db-sqlite", feature = "media-local")))]
compile_error!("boulder-catalog needs the web-axum, db-sqlite and media-local features");

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{build_router, AppState, FormLimits, HttpUploadEndpoint};
use configs::AppConfig;
use domains::{ImageConverter, MediaStorage, UploadEndpoint};
use services::{BoulderSynchronizer, CatalogSettings, StorageUploadEndpoint};
use storage_adapters::{
    CommandJpegConverter, LocalMediaStorage, RasterJpegConverter, SqliteBoulderRepository,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);

    // --- Store ---
    let repo = SqliteBoulderRepository::connect(&config.database.url)
        .await
        .with_context(|| format!("opening {}", config.database.url))?;

    // --- Media ---
    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("creating {}", config.media.root.display()))?;
    let storage: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(
        config.media.root.clone(),
        config.media.url_prefix.clone(),
    ));
    let upload_service = Arc::new(StorageUploadEndpoint::new(storage));

    let converter: Arc<dyn ImageConverter> = match &config.convert.heif_command {
        Some(program) => {
            tracing::info!(program = %program.display(), "HEIC photos converted by external tool");
            Arc::new(CommandJpegConverter::new(program.clone()))
        }
        None => Arc::new(RasterJpegConverter),
    };

    let uploads: Arc<dyn UploadEndpoint> = match &config.upload.endpoint {
        Some(url) => {
            tracing::info!(%url, "photos sent to remote upload endpoint");
            Arc::new(HttpUploadEndpoint::new(url.clone()))
        }
        None => upload_service.clone() as Arc<dyn UploadEndpoint>,
    };

    // --- Catalogue ---
    let catalog = Arc::new(BoulderSynchronizer::new(Arc::new(repo)));
    if let Ok(boulders) = catalog.list().await {
        tracing::info!(count = boulders.len(), "catalogue loaded");
    }

    let state = AppState::new(
        catalog,
        converter,
        uploads,
        upload_service,
        CatalogSettings {
            default_sector_id: config.catalog.default_sector_id,
        },
    )
    .with_form_limits(FormLimits {
        ttl: Duration::from_secs(config.forms.ttl_secs),
        max_open: config.forms.max_open,
    });
    let app = build_router(state, &config.media.root, &config.media.url_prefix);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "boulder catalogue listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));

    let (json, plain) = if config.log.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
