use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "ontoforge")]
#[command(about = "Extract, merge and prune ontologies into entity graphs.")]
#[command(version)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one ontology config
    Extract {
        /// Ontology config document (JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Directory for the source and compact artifacts
        #[arg(long, short, default_value = "out")]
        out: PathBuf,

        /// Engine settings file. Defaults to ontoforge.toml in the data directory.
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Check an ontology config document without running it
    Validate {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Print the compact projection of a source artifact
    Compact {
        /// A `<name>.source.json` artifact
        #[arg(value_name = "SOURCE_JSON")]
        source: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Extract {
            config,
            out,
            settings,
        } => commands::extract::run(&config, &out, settings.as_deref()).await,
        Commands::Validate { config } => commands::validate::run(&config),
        Commands::Compact { source } => commands::compact::run(&source),
    }
}
