//! gw: command line client for graphwire clusters.
//!
//! ```text
//! gw --address a:1729 --address b:1729 databases list
//! gw query social 'match $p isa person;'
//! gw query social 'define person sub entity;' --schema --write
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use graphwire::Connection;

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "gw",
    about = "graphwire cluster client",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Config file (default: ./graphwire.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server address; repeat for several cluster members
    #[arg(short, long = "address", global = true)]
    addresses: Vec<String>,

    #[arg(short, long, global = true)]
    username: Option<String>,

    #[arg(long, env = "GRAPHWIRE_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Connect over TLS
    #[arg(long, global = true)]
    tls: bool,

    /// PEM root certificate for TLS (default: platform trust store)
    #[arg(long, global = true)]
    tls_root_ca: Option<PathBuf>,

    /// Log driver internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage databases
    Databases {
        #[command(subcommand)]
        action: DatabasesAction,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Run a query in a fresh session and transaction.
    ///
    /// Match queries print one line per answer. Writes are committed only
    /// with --write; without it the transaction is read-only.
    Query {
        database: String,
        query: String,
        /// Open a schema session (for define/undefine)
        #[arg(long)]
        schema: bool,
        /// Open a write transaction and commit it
        #[arg(long)]
        write: bool,
    },
}

#[derive(Subcommand)]
enum DatabasesAction {
    /// List databases and their primaries
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    Create { name: String },
    Delete { name: String },
    /// Print the schema of a database
    Schema { name: String },
}

#[derive(Subcommand)]
enum UsersAction {
    List,
    Create { username: String, password: String },
    Delete { username: String },
}

impl Cli {
    /// File settings overridden by flags.
    fn resolve_config(&self) -> anyhow::Result<CliConfig> {
        let mut config = match &self.config {
            Some(path) => CliConfig::from_file(path)?,
            None => {
                let default = PathBuf::from("graphwire.toml");
                if default.exists() {
                    CliConfig::from_file(&default)?
                } else {
                    CliConfig::default()
                }
            }
        };
        if !self.addresses.is_empty() {
            config.addresses = self.addresses.clone();
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if self.tls {
            config.tls = true;
        }
        if let Some(ca) = &self.tls_root_ca {
            config.tls_root_ca = Some(ca.clone());
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose {
        "warn,graphwire=debug"
    } else {
        "warn,graphwire=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = cli.resolve_config()?;
    let connection = Connection::open(&config.seeds(), config.credential()?).await?;

    let outcome = match cli.command {
        Commands::Databases { action } => match action {
            DatabasesAction::List { format } => commands::databases::list(&connection, &format).await,
            DatabasesAction::Create { name } => commands::databases::create(&connection, &name).await,
            DatabasesAction::Delete { name } => commands::databases::delete(&connection, &name).await,
            DatabasesAction::Schema { name } => commands::databases::schema(&connection, &name).await,
        },
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list(&connection).await,
            UsersAction::Create { username, password } => {
                commands::users::create(&connection, &username, &password).await
            }
            UsersAction::Delete { username } => commands::users::delete(&connection, &username).await,
        },
        Commands::Query {
            database,
            query,
            schema,
            write,
        } => {
            let request = commands::query::QueryRequest {
                database: &database,
                query: &query,
                schema,
                write,
                options: config.options.clone(),
            };
            commands::query::run(&connection, request).await
        }
    };

    connection.close().await;
    outcome
}
