//! The `picturetale serve` command.

use clap::Args;
use picturetale_core::Config;

use super::pipeline_args::{self, PipelineArgs};
use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    args.pipeline.apply(&mut config);
    pipeline_args::prompt_for_missing_token(&mut config)?;

    server::run(config).await
}
