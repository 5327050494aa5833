use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use snowshare::config::{format_config, Config};
use snowshare::logging::{init_logging, LogConfig, Verbosity};
use snowshare::warehouse::SqliteWarehouse;
use snowshare::{Resource, ResourceData, ShareConfig, ShareResource};

#[derive(Parser)]
#[command(name = "snowshare")]
#[command(version)]
#[command(about = "Reconcile warehouse share definitions")]
#[command(
    long_about = "Applies declarative share definitions (name, comment, granted accounts) against a local emulated warehouse and prints the observed state."
)]
struct Cli {
    /// Path to the config file (default: ~/.config/snowshare/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file in addition to stderr
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the share declared in a manifest
    Apply {
        /// Path to a TOML manifest with a [share] table
        manifest: PathBuf,
    },
    /// Print the observed state of a share
    Show { name: String },
    /// Report whether a share exists
    Exists { name: String },
    /// Adopt an existing share and print the resource record (id, config, state)
    Import { name: String },
    /// Drop a share
    Destroy { name: String },
    /// Print the share resource schema as JSON
    Schema,
    /// Print the effective configuration
    Config,
}

/// Manifest file declaring one share.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    share: ShareConfig,
}

fn load_manifest(path: &Path) -> Result<ShareConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let manifest: Manifest = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;
    Ok(manifest.share)
}

fn open_warehouse(config: &Config) -> Result<SqliteWarehouse> {
    let path = config.effective_database_path();
    let mut warehouse = SqliteWarehouse::open(&path, config.effective_account())
        .with_context(|| format!("Failed to open warehouse at {}", path.display()))?;
    if let Some(ref owner) = config.owner {
        warehouse = warehouse.with_owner(owner.clone());
    }
    Ok(warehouse)
}

fn print_state(data: &ResourceData) -> Result<()> {
    let state = data
        .state()
        .context("Share has no observed state after the operation")?;
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

/// Print what a host persists after import: the identifier, the config seeded
/// from it, and the observed state.
fn print_record(data: &ResourceData) -> Result<()> {
    let record = serde_json::json!({
        "id": data.id(),
        "config": data.config,
        "state": data.state(),
    });
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let _guard = init_logging(&LogConfig {
        verbosity: Verbosity::from_occurrences(cli.verbose),
        log_file: cli.log_file.clone().or_else(|| config.log_file.clone()),
    });

    let resource = ShareResource::new();

    match cli.command {
        Commands::Apply { manifest } => {
            let declared = load_manifest(&manifest)?;
            let warehouse = open_warehouse(&config)?;

            let existing = ResourceData::imported(declared.name.clone());
            let data = if resource.exists(&existing, &warehouse)? {
                let mut data = resource
                    .import(&declared.name, &warehouse)
                    .with_context(|| format!("Failed to read share {}", declared.name))?;
                data.config = declared;
                resource.update(&mut data, &warehouse)?;
                data
            } else {
                let mut data = ResourceData::new(declared);
                resource.create(&mut data, &warehouse)?;
                data
            };

            print_state(&data)?;
        }
        Commands::Show { name } => {
            let warehouse = open_warehouse(&config)?;
            let data = resource.import(&name, &warehouse)?;
            print_state(&data)?;
        }
        Commands::Import { name } => {
            let warehouse = open_warehouse(&config)?;
            let data = resource
                .import(&name, &warehouse)
                .with_context(|| format!("Failed to import share {}", name))?;
            print_record(&data)?;
        }
        Commands::Exists { name } => {
            let warehouse = open_warehouse(&config)?;
            let exists = resource.exists(&ResourceData::imported(name), &warehouse)?;
            println!("{}", exists);
        }
        Commands::Destroy { name } => {
            let warehouse = open_warehouse(&config)?;
            let mut data = ResourceData::imported(name.clone());
            resource.delete(&mut data, &warehouse)?;
            println!("Dropped share {}", name);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(resource.schema())?);
        }
        Commands::Config => {
            println!("{}", format_config(&config));
        }
    }

    Ok(())
}
