//! `gazetteer run` — execute one full resolution pass over the configured
//! database: parse-or-reuse, canonicalize, conflict-check, recall, score,
//! judge, and union, emitting a summary and writing clusters/match logs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gazetteer_core::alias::AliasMap;
use gazetteer_core::canonicalize::Canonicalizer;
use gazetteer_core::config::Config;
use gazetteer_core::judge::LlmArbitrator;
use gazetteer_core::parser::AddressParser;
use gazetteer_core::pipeline::Pipeline;
use gazetteer_core::repository::Repository;
use gazetteer_core::scoring::Scorer;
use gazetteer_db::{init_database, Pool, PoolConfig, SqliteRepository};
use gazetteer_parser::OpenAiClient;
use tracing::info;

use super::utils::{create_spinner, success, info as print_info, LOOKING_GLASS};

#[derive(Parser)]
pub struct RunArgs {
    /// Run configuration JSON (db_path, weights, thresholds, ...).
    #[arg(short, long, default_value = "data/config.default.json")]
    pub config: PathBuf,

    /// Directory holding `aoi_aliases.json`/`road_aliases.json`. Defaults to
    /// the configuration file's own directory.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Let the judge fall back to an LLM tiebreak when no rule resolves a
    /// record's best candidate.
    #[arg(long)]
    pub use_llm: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    print_info(&format!("{}Running resolution pipeline", LOOKING_GLASS));

    let cfg = Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;
    let data_dir = args
        .data_dir
        .or_else(|| args.config.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let pool = Pool::new(PoolConfig::builder().db_path(cfg.db_path.clone()).build())
        .await
        .context("opening database")?;
    init_database(&pool).await.context("running migrations")?;
    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(&pool));

    let aoi_aliases = load_alias_map_or_default(&data_dir.join("alias_aoi.json"));
    let road_aliases = load_alias_map_or_default(&data_dir.join("alias_road.json"));
    let canonicalizer = Canonicalizer::new(aoi_aliases, road_aliases);

    let scorer = Scorer::new(cfg.weights.clone(), cfg.thresholds());

    let client = Arc::new(OpenAiClient::from_env());
    let parser: Arc<dyn AddressParser> = client.clone();
    let llm: Arc<dyn LlmArbitrator> = client;

    let pipeline = Pipeline::new(
        repo,
        parser,
        canonicalizer,
        scorer,
        Some(llm),
        cfg.grid_precision,
        cfg.candidate_max,
        cfg.candidate_topn_for_llm,
    );

    let spinner = create_spinner("Resolving records...");
    let summary = pipeline.run(args.use_llm).await.context("pipeline run failed")?;
    spinner.finish_and_clear();

    info!(?summary, "pipeline finished");
    success(&format!(
        "Processed {} records: {} conflicts, {} clusters with more than one member",
        summary.n_records, summary.n_conflicts, summary.n_clusters_gt1
    ));
    print_info(&format!("Database: {}", cfg.db_path));

    Ok(())
}

fn load_alias_map_or_default(path: &std::path::Path) -> AliasMap {
    match AliasMap::load(path) {
        Ok(m) => m,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "no alias map loaded, using empty map");
            AliasMap::default()
        }
    }
}
