use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use crate::commands::CommandContext;
use anyhow::Result;
use staffdesk_access::ResolverConfig;

/// Inspect StaffDesk resource catalogs and grant files
#[derive(Parser, Debug)]
#[command(name = "staffdesk", about = "StaffDesk access control tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands for staffdesk
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every canonical key of a catalog, parent first
    Keys {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Evaluate one resource against a grant file
    Check {
        /// JSON list of grant rows: [{"resource": "...", "allowed": true}]
        #[arg(long, required_unless_present = "anonymous")]
        grants: Option<PathBuf>,

        /// Evaluate with no signed-in actor
        #[arg(long)]
        anonymous: bool,

        /// Canonical key, e.g. tab:/employees:list
        resource: String,
    },

    /// Print the administration matrix for a grant file
    Matrix {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// JSON list of grant rows
        #[arg(long)]
        grants: Option<PathBuf>,

        /// Emit rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("STAFFDESK_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ResolverConfig::from_env()?;
    let ctx = CommandContext::new(config);

    match cli.command {
        Commands::Keys { catalog } => {
            commands::keys::list_keys(&catalog)?;
        }
        Commands::Check { grants, anonymous, resource } => {
            commands::check::check_resource(&ctx, grants.as_deref(), anonymous, &resource).await?;
        }
        Commands::Matrix { catalog, grants, json } => {
            commands::matrix::show_matrix(&ctx, &catalog, grants.as_deref(), json).await?;
        }
    }

    Ok(())
}
