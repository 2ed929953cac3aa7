mod harvest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gridharvest-cli")]
#[command(about = "Harvest product grids from infinite-scroll category pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Harvest a store's seed page through a live browser session
    Harvest {
        /// Store slug or display name from the stores file
        store: String,
        /// Directory for the JSON output (defaults to `GRIDHARVEST_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run the engine over a saved page, e.g. a failure dump
    Replay {
        /// Store slug or display name from the stores file
        store: String,
        /// Saved HTML page to harvest
        #[arg(long)]
        html: PathBuf,
        /// Directory for the JSON output (defaults to `GRIDHARVEST_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List configured stores
    Stores,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = gridharvest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Harvest { store, output_dir } => {
            harvest::run_live(&config, &store, output_dir.as_deref()).await
        }
        Commands::Replay {
            store,
            html,
            output_dir,
        } => harvest::run_replay(&config, &store, &html, output_dir.as_deref()).await,
        Commands::Stores => harvest::list_stores(&config),
    }
}

#[cfg(test)]
mod tests;
