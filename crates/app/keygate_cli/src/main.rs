// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use chrono::Duration;
use clap::Parser;
use cli::{Cli, Commands};
use keygate_api::config::BootstrapClient;
use keygate_core::auth::jwt::{
    TokenCodec, TokenConfig, generate_secret, lookup_jwt_secret, resolve_jwt_secret,
};
use keygate_core::auth::password::{hash_secret, verify_secret};
use keygate_core::clock::SystemClock;
use keygate_core::models::auth::TokenKind;

mod cli;
mod inspect;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::HashSecret { secret } => {
            println!("{}", hash_secret(&secret)?);
        }
        Commands::VerifySecret { secret, hash } => {
            if !verify_secret(&secret, &hash)? {
                return Err(Error::Custom("secret does not match".into()));
            }
            println!("ok");
        }
        Commands::GenSecret => {
            println!("{}", generate_secret());
        }
        Commands::IssueToken {
            client_id,
            kind,
            ttl_secs,
            signing,
        } => {
            let kind = TokenKind::from(kind);
            let secret = signing.secret.unwrap_or_else(resolve_jwt_secret);
            let mut config = TokenConfig::new(secret);
            if let Some(secs) = ttl_secs {
                if secs <= 0 {
                    return Err(Error::Custom("--ttl-secs must be positive".into()));
                }
                let ttl = Duration::seconds(secs);
                let (access, refresh) = match kind {
                    TokenKind::Access => (ttl, config.refresh_ttl),
                    TokenKind::Refresh => (config.access_ttl, ttl),
                };
                config = config.with_ttls(access, refresh);
            }
            let codec = TokenCodec::new(config, Arc::new(SystemClock));
            let claims = codec.claims_for(&client_id, kind);
            log::debug!("{kind} token for {client_id} expires at {}", claims.exp);
            println!("{}", codec.encode(&claims)?);
        }
        Commands::DecodeToken { token, signing } => {
            // Decoding never creates a secret.
            let secret = signing
                .secret
                .or_else(lookup_jwt_secret)
                .ok_or_else(|| {
                    Error::Custom("no signing secret: pass --secret or set JWT_SECRET".into())
                })?;
            let codec = TokenCodec::new(TokenConfig::new(secret), Arc::new(SystemClock));
            let claims = codec.decode(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Commands::BootstrapClient {
            client_id,
            client_secret,
            store,
        } => {
            let client = BootstrapClient {
                client_id,
                client_secret,
            };
            block_on(inspect::bootstrap_client(&store, client))??;
        }
        Commands::Users { store } => block_on(inspect::users(&store))??,
        Commands::Roles { store } => block_on(inspect::roles(&store))??,
        Commands::Permissions { store } => block_on(inspect::permissions(&store))??,
        Commands::UserPerms { username, store } => {
            block_on(inspect::user_perms(&store, username.as_deref()))??;
        }
    }

    Ok(())
}

/// Drive one store command to completion.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
