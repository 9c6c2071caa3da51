mod config;
mod server;

use std::path::PathBuf;
use std::{env, fs};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use config::Config;
use turf_core::{issue_token, now_unix_secs};
use turf_store::{ScoreLedger, Store, TerritoryEngine};

#[derive(Parser)]
#[command(name = "turf", about = "Territory capture service CLI and HTTP server")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a turf.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080
        #[arg(long)]
        listen: Option<String>,
    },

    /// Install a new hotspot and print its credentials
    Setup,

    /// Rotate a hotspot's advertised identifier
    Rotate {
        /// The hotspot's administrator token
        token: String,
    },

    /// Show row counts and the points in circulation
    Stats,
}

fn default_db_path() -> PathBuf {
    let base = env::var("TURF_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".turf"));
    base.join("turf.db")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn open_store(cli: &Cli) -> Result<Store> {
    let path = cli.db.clone().unwrap_or_else(default_db_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Store::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve { listen } => cmd_serve(&cli, listen.as_deref()).await,
        Commands::Setup => cmd_setup(&cli),
        Commands::Rotate { token } => cmd_rotate(&cli, token),
        Commands::Stats => cmd_stats(&cli),
    }
}

/// Admin key resolution: environment beats the config file; with
/// neither, a key is minted for this run and logged so the operator can
/// still reach the setup endpoint.
fn resolve_admin_key(config: &Config) -> String {
    if let Ok(key) = env::var("TURF_ADMIN_KEY") {
        return key;
    }
    if let Some(key) = &config.admin_key {
        return key.clone();
    }
    let key = issue_token(&mut SmallRng::from_os_rng());
    tracing::warn!("no admin key configured; using generated key {key} for this run");
    key
}

async fn cmd_serve(cli: &Cli, listen: Option<&str>) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let store = open_store(cli)?;
    let admin_key = resolve_admin_key(&config);
    let listen = listen.unwrap_or_else(|| config.listen());
    let endpoint = config.endpoint().to_string();

    let server = server::TurfServer::new(store, config.tunables, admin_key, endpoint);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, server.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
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

fn cmd_setup(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let store = open_store(cli)?;
    let territory = TerritoryEngine::new(&store, config.tunables);

    let hotspot = territory
        .create(&mut SmallRng::from_os_rng(), now_unix_secs())
        .context("failed to install hotspot")?;

    println!("token: {}", hotspot.token);
    println!("ssid:  {}", hotspot.ssid);
    Ok(())
}

fn cmd_rotate(cli: &Cli, token: &str) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let store = open_store(cli)?;
    let territory = TerritoryEngine::new(&store, config.tunables);

    let hotspot = territory
        .by_token(token)
        .context("failed to look up hotspot")?
        .context("no hotspot with that token")?;
    let ssid = territory.rotate(&hotspot).context("failed to rotate")?;

    println!("ssid:  {ssid}");
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let ledger = ScoreLedger::new(&store);

    println!("profiles:   {}", store.count("profiles")?);
    println!("hotspots:   {}", store.count("hotspots")?);
    println!("positions:  {}", store.count("positions")?);
    println!("points:     {}", ledger.grand_total()?);
    Ok(())
}
