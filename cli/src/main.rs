//! `heroes` command-line host for the hero data-access core.
//!
//! Wires one configured gateway, the hero service and an in-memory message
//! log together, runs a single operation and prints the result as JSON on
//! stdout. Diagnostic messages go to stderr once the command finishes.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use hero_core::{
    GatewayCell, GatewayConfig, Hero, HeroService, HttpTransport, MessageLog, NewHero,
};
use serde_json::json;

/// Query and edit heroes through a GraphQL endpoint.
#[derive(Parser)]
#[command(name = "heroes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML gateway configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GraphQL endpoint; overrides the config file.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Per-request timeout in milliseconds; overrides the config file.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every hero.
    List,
    /// Fetch one hero by id.
    Get {
        id: i64,
        /// Report a missing hero as absence instead of a failure.
        #[arg(long)]
        lenient: bool,
    },
    /// Find heroes whose name contains a term.
    Search { term: String },
    /// Add a hero; the server assigns the id.
    Add { name: String },
    /// Delete a hero by id.
    Delete { id: i64 },
    /// Rename a hero.
    Update { id: i64, name: String },
    /// Print the hero list now and after every change, until Ctrl-C.
    Watch,
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, service: &HeroService) -> anyhow::Result<()> {
    match command {
        Commands::List => print_json(&service.heroes().await),
        Commands::Get { id, lenient } => {
            let hero = if lenient {
                service.hero_no_404(id).await
            } else {
                service.hero(id).await
            };
            print_json(&hero)
        }
        Commands::Search { term } => print_json(&service.search_heroes(&term).await),
        Commands::Add { name } => print_json(&service.add_hero(&NewHero::new(name)).await),
        Commands::Delete { id } => print_json(&service.delete_hero(id).await),
        Commands::Update { id, name } => {
            print_json(&service.update_hero(&Hero::new(id, name)).await)
        }
        Commands::Watch => {
            let mut watch = service.watch_heroes();
            loop {
                tokio::select! {
                    heroes = watch.next() => match heroes {
                        Some(heroes) => print_json(&json!({ "heroes": heroes }))?,
                        None => break,
                    },
                    signal = tokio::signal::ctrl_c() => {
                        signal?;
                        break;
                    }
                }
            }
            watch.unsubscribe();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let transport = HttpTransport::new().context("building HTTP client")?;
    let gateway = GatewayCell::new();
    gateway
        .configure(config, Arc::new(transport))
        .context("configuring gateway")?;

    let log = Arc::new(MessageLog::new());
    let service = HeroService::from_cell(&gateway, log.clone())?;

    let result = run(cli.command, &service).await;
    for message in log.drain() {
        eprintln!("{message}");
    }
    result
}
