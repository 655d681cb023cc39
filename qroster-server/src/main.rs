//! qroster-server - roster importer and QR issuing service
//!
//! Serves the dashboard, the public detail page and the `/api` endpoints
//! backed by a SQLite record store in the root folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qroster_common::config::{CompiledDefaults, RootFolderInitializer, TomlConfig};
use qroster_server::config::{CliOverrides, ServerConfig};
use qroster_server::services::QrIssuer;
use qroster_server::{build_router, AppState};

/// Command-line arguments for qroster-server
#[derive(Parser, Debug)]
#[command(name = "qroster-server")]
#[command(about = "Spreadsheet roster importer with per-record QR codes")]
#[command(version)]
struct Args {
    /// Root folder holding the database and QR images
    #[arg(short, long, env = "QROSTER_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "QROSTER_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "QROSTER_PORT")]
    port: Option<u16>,

    /// Base URL of the public detail page encoded into QR codes
    #[arg(long, env = "QROSTER_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Directory of prebuilt dashboard assets served as fallback
    #[arg(long, env = "QROSTER_STATIC_ASSETS")]
    static_assets: Option<PathBuf>,

    /// TOML config file (defaults to <config dir>/qroster/config.toml)
    #[arg(short, long, env = "QROSTER_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            root_folder: args.root_folder,
            bind: args.bind,
            port: args.port,
            public_base_url: args.public_base_url,
            static_assets: args.static_assets,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level can seed the filter
    let toml_config = TomlConfig::load_or_default(args.config.as_deref());
    let log_level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| CompiledDefaults::for_current_platform().log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "qroster_server={0},qroster_common={0},tower_http={0}",
                log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting qroster-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = toml_config.context("Failed to load configuration")?;
    let config = ServerConfig::resolve(args.into(), &toml_config);

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", config.root_folder.display());

    let db_path = initializer.database_path();
    let pool = qroster_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database connection established");

    let issuer = QrIssuer::new(
        initializer.qr_codes_path(),
        &config.public_base_url,
        config.qr.clone(),
    );
    info!(
        "QR codes: {} (payload base {})",
        issuer.qr_dir().display(),
        config.public_base_url
    );

    let state = AppState::new(pool.clone(), issuer).with_static_assets(config.static_assets.clone());
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
