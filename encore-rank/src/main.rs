//! encore-rank - practice ranking service
//!
//! Serves per-user ranks, global top-N lists and the song-of-the-week
//! leaderboard, and rotates the song of the week every Monday.

use anyhow::{Context, Result};
use clap::Parser;
use encore_common::config::{
    ensure_root_folder, load_service_config, resolve_root_folder, ROOT_ENV_VAR,
};
use encore_common::db::init_database;
use encore_rank::services::{spawn_periodic, WeeklyTrigger};
use encore_rank::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for encore-rank
#[derive(Parser, Debug)]
#[command(name = "encore-rank")]
#[command(about = "Practice ranking and song-of-the-week service")]
#[command(version)]
struct Args {
    /// Folder holding encore.db and encore.toml
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Port to listen on (overrides encore.toml)
    #[arg(short, long, env = "ENCORE_PORT")]
    port: Option<u16>,

    /// Do not run the weekly song rotation in this process
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_rank=info,encore_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Encore Rank (encore-rank) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_ENV_VAR);
    info!("Root folder: {}", root_folder.display());
    let db_path = ensure_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;

    let mut config = load_service_config(&root_folder).context("Failed to load encore.toml")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.no_scheduler {
        config.scheduler_enabled = false;
    }

    info!("Database: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let addr = format!("{}:{}", config.bind_address, config.port);
    let state = AppState::new(pool, config).context("Invalid service configuration")?;

    if state.config.scheduler_enabled {
        start_scheduler(&state).await?;
    } else {
        warn!("Weekly song rotation disabled in this process");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("encore-rank listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Bootstrap the current and upcoming weeks, then run on every week boundary
async fn start_scheduler(state: &AppState) -> Result<()> {
    let offset = encore_common::time::utc_offset(state.config.week_utc_offset_minutes)?;
    let scheduler = state.scheduler.clone();

    match scheduler.run_scheduled(encore_common::time::now()).await {
        Ok(outcome) => info!("Song-of-the-week bootstrap: {:?}", outcome),
        Err(e) => error!("Song-of-the-week bootstrap failed, retrying at next trigger: {}", e),
    }

    spawn_periodic("Song-of-the-week rotation", WeeklyTrigger::new(offset), move |fire| {
        let scheduler = scheduler.clone();
        async move { scheduler.run_scheduled(fire).await }
    });
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
