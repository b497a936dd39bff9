//! picturetale CLI - turn a photo into a narrated short story.
//!
//! An uploaded image is captioned, the caption is expanded into a story, and
//! the story is read aloud. Every step is a hosted model call.
//!
//! # Usage
//!
//! ```bash
//! # Serve the single-page web UI
//! picturetale serve --port 8501
//!
//! # Run the whole pipeline once from the terminal
//! picturetale run dog.jpg --output story.wav
//!
//! # View configuration
//! picturetale config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// picturetale - turn a photo into a narrated short story.
#[derive(Parser, Debug)]
#[command(name = "picturetale")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "PICTURETALE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the web UI (upload, caption, story, audio player)
    Serve(cli::serve::ServeArgs),

    /// Caption, expand, and narrate a single image from the terminal
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API tokens may live in a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `picturetale config path`."
            );
            picturetale_core::Config::default()
        }
    };
    logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("picturetale v{}", picturetale_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}
