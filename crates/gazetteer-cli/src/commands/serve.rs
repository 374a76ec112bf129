//! `gazetteer serve` — boot the `/compare` HTTP façade over the configured
//! database and alias files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gazetteer_core::config::Config as PipelineConfig;
use gazetteer_server::ServerConfig;

use super::utils::{info as print_info, success};

#[derive(Parser)]
pub struct ServeArgs {
    /// Server host address.
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Server port.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Engine run configuration JSON (weights, thresholds, candidate limits, ...).
    #[arg(short, long, default_value = "data/config.default.json")]
    pub config: PathBuf,

    /// Directory holding `aoi_aliases.json`/`road_aliases.json`. Defaults to
    /// the configuration file's own directory.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Let `/compare` invoke the LLM judge tiebreak whenever a request omits `use_llm`.
    #[arg(long)]
    pub default_use_llm: bool,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let pipeline_config =
        PipelineConfig::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;
    let data_dir = args
        .data_dir
        .or_else(|| args.config.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let server_config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
        db_path: pipeline_config.db_path.clone(),
        default_use_llm: args.default_use_llm,
        ..ServerConfig::default()
    };

    println!();
    println!("{}", console::style("  Gazetteer Resolution Server").cyan().bold());
    println!("  {} http://{}:{}/api/v1", console::style("->").green(), args.host, args.port);
    println!("  {} http://{}:{}/swagger-ui", console::style("->").green(), args.host, args.port);
    println!();

    print_info("Press Ctrl+C to stop");
    gazetteer_server::serve(server_config, pipeline_config, &data_dir)
        .await
        .context("server error")?;

    success("Server stopped");
    Ok(())
}
