//! Application state: the resolution pipeline and configuration shared
//! across request handlers.

use std::path::Path;
use std::sync::Arc;

use gazetteer_core::alias::AliasMap;
use gazetteer_core::canonicalize::Canonicalizer;
use gazetteer_core::config::Config as PipelineConfig;
use gazetteer_core::judge::LlmArbitrator;
use gazetteer_core::parser::AddressParser;
use gazetteer_core::pipeline::Pipeline;
use gazetteer_core::repository::Repository;
use gazetteer_core::scoring::Scorer;
use gazetteer_db::{Pool, PoolConfig, SqliteRepository};
use gazetteer_parser::OpenAiClient;

use crate::{config::ServerConfig, error::ServerResult, ServerError};

/// Shared application state, cloned cheaply (everything behind an `Arc`) for
/// each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The resolution pipeline this server exposes over `/compare`.
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Build application state from server config, the engine's run config,
    /// and a data directory holding `aoi_aliases.json`/`road_aliases.json`
    /// (missing alias files degrade gracefully to empty maps).
    pub async fn new(config: ServerConfig, pipeline_config: PipelineConfig, data_dir: &Path) -> ServerResult<Self> {
        let pool = Pool::new(PoolConfig::builder().db_path(config.db_path.clone()).build())
            .await
            .map_err(|e| ServerError::Configuration(e.to_string()))?;
        gazetteer_db::init_database(&pool)
            .await
            .map_err(|e| ServerError::Configuration(e.to_string()))?;

        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(&pool));

        let aoi_aliases = load_alias_map_or_default(&data_dir.join("aoi_aliases.json"));
        let road_aliases = load_alias_map_or_default(&data_dir.join("road_aliases.json"));
        let canonicalizer = Canonicalizer::new(aoi_aliases, road_aliases);

        let scorer = Scorer::new(pipeline_config.weights.clone(), pipeline_config.thresholds());

        let client = Arc::new(OpenAiClient::from_env());
        let parser: Arc<dyn AddressParser> = client.clone();
        let llm: Arc<dyn LlmArbitrator> = client;

        let pipeline = Pipeline::new(
            repo,
            parser,
            canonicalizer,
            scorer,
            Some(llm),
            pipeline_config.grid_precision,
            pipeline_config.candidate_max,
            pipeline_config.candidate_topn_for_llm,
        );

        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        })
    }
}

fn load_alias_map_or_default(path: &Path) -> AliasMap {
    match AliasMap::load(path) {
        Ok(m) => m,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "no alias map loaded, using empty map");
            AliasMap::default()
        }
    }
}
