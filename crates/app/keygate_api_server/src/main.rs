//! Keygate API server binary.
//!
//! Flags override the matching environment variables read by
//! `ApiConfig::from_env`.

use clap::Parser;
use keygate_api::AppState;
use keygate_api::config::ApiConfig;
use keygate_api::services::bootstrap;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "keygate_api_server", about = "Keygate token and RBAC API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind_addr: String,

    /// SQLite connection URL (e.g. `sqlite://keygate.db`). Omit to keep
    /// identities in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keygate_api=debug,keygate_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url.filter(|url| !url.is_empty());

    info!(
        bind_addr = %config.bind_addr,
        persistent = config.database_url.is_some(),
        access_ttl_secs = config.access_token_ttl_secs,
        refresh_ttl_secs = config.refresh_token_ttl_secs,
        "starting keygate_api_server"
    );

    let store = bootstrap::open_store(config.database_url.as_deref(), args.max_connections).await?;

    match &config.bootstrap_client {
        Some(client) => {
            bootstrap::ensure_bootstrap_client(store.as_ref(), client).await?;
        }
        None if store.list_identities().await?.is_empty() => {
            warn!("no identities and no BOOTSTRAP_CLIENT_ID set; nobody can obtain a token");
        }
        None => {}
    }

    let state = AppState::new(config.clone(), store);
    let app = keygate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
