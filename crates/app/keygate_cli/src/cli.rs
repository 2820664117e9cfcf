use clap::{Parser, Subcommand, ValueEnum};
use keygate_core::models::auth::TokenKind;

#[derive(Parser, Debug)]
#[command(name = "keygate", version, about = "Keygate operator tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the CLI version.
    Version,

    /// Print a bcrypt hash of a client secret or password.
    HashSecret {
        secret: String,
    },

    /// Check a secret against a bcrypt hash.
    VerifySecret {
        secret: String,
        hash: String,
    },

    /// Print a random signing secret.
    GenSecret,

    /// Sign a token for a client id.
    IssueToken {
        #[arg(long)]
        client_id: String,

        #[arg(long, value_enum, default_value_t = Kind::Access)]
        kind: Kind,

        /// Lifetime in seconds. Defaults to the server default for `kind`.
        #[arg(long)]
        ttl_secs: Option<i64>,

        #[command(flatten)]
        signing: Signing,
    },

    /// Verify a token and print its claims as JSON.
    DecodeToken {
        token: String,

        #[command(flatten)]
        signing: Signing,
    },

    /// Create a client holding `admin` in the store, or re-grant `admin`
    /// to an existing one.
    BootstrapClient {
        #[arg(long)]
        client_id: String,

        #[arg(long, env = "BOOTSTRAP_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List stored identities with their roles.
    Users {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List roles and their permissions.
    Roles {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List permissions.
    Permissions {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Effective permissions per identity and the role granting each.
    UserPerms {
        /// Only this username.
        #[arg(long)]
        username: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// SQLite connection URL of the server's store. Created, migrated and
    /// seeded if missing.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

#[derive(clap::Args, Debug)]
pub struct Signing {
    /// Signing secret. Falls back to `AUTH_SECRET`, then the persisted
    /// server secret file.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Kind {
    Access,
    Refresh,
}

impl From<Kind> for TokenKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Access => TokenKind::Access,
            Kind::Refresh => TokenKind::Refresh,
        }
    }
}
