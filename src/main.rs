//! Keepsake - session and abuse-control core for a private memory journal
//!
//! `keepsake serve` runs the HTTP server; `keepsake hash-password` prints an
//! Argon2id hash for `APP_PASSWORD_HASH`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keepsake::auth::hash_password;
use keepsake::store::{InMemoryStore, JournalStore, RestStore};
use keepsake::{create_router, spawn_cleanup_task, AppState, Config};

#[derive(Parser)]
#[command(name = "keepsake", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print an Argon2id PHC hash for APP_PASSWORD_HASH
    HashPassword {
        /// Password to hash
        #[arg(env = "KEEPSAKE_PASSWORD")]
        password: String,
    },
}

/// Main entry point for the Keepsake server.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize tracing
/// 2. Load and validate configuration; missing secrets abort startup
/// 3. Select the journal store and build application state
/// 4. Start background cleanup task
/// 5. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keepsake=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::HashPassword { password } => {
            let hash = hash_password(&password)
                .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
            println!("{hash}");
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    info!("Starting Keepsake server");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Configuration loaded: port={}, session_ttl={}s, cache_max_entries={}, cache_default_ttl={}s, cleanup_interval={}s, production={}",
        config.server_port,
        config.session_ttl,
        config.cache_max_entries,
        config.cache_default_ttl,
        config.cleanup_interval,
        config.production
    );

    let store: Arc<dyn JournalStore> = match (&config.backend_url, &config.backend_api_key) {
        (Some(url), Some(key)) => {
            info!(backend = %url, "Using hosted journal backend");
            Arc::new(RestStore::new(url.clone(), key.clone()))
        }
        _ => {
            warn!("BACKEND_URL/BACKEND_API_KEY not set, using in-memory journal store");
            Arc::new(InMemoryStore::new())
        }
    };

    let state = AppState::from_config(&config, store).context("invalid configuration")?;

    let cleanup_handle = spawn_cleanup_task(
        state.cache.clone(),
        state.login_limiter.clone(),
        state.content_limiter.clone(),
        config.cleanup_interval,
    );
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
