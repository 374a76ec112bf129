//! `gazetteer evaluate` — precision/recall/F1 of the configured scorer over
//! labeled pairs, plus a threshold/weight grid search whose winner is
//! written out as a ready-to-use configuration file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use gazetteer_core::config::Config;
use gazetteer_core::evaluate::{default_grid_points, evaluate_point, grid_search, GridPoint, LabeledPair};
use gazetteer_core::model::{AddressRecord, ParsedAddress};
use gazetteer_db::{init_database, Pool, PoolConfig, SqliteRepository};
use gazetteer_core::repository::Repository;
use clap::Parser;
use tracing::info;

use super::utils::{success, info as print_info, warning, LOOKING_GLASS};

#[derive(Parser)]
pub struct EvaluateArgs {
    /// Run configuration JSON (db_path, weights, thresholds, ...).
    #[arg(short, long, default_value = "data/config.default.json")]
    pub config: PathBuf,

    /// Skip the grid search and only report the current configuration's metrics.
    #[arg(long)]
    pub current_only: bool,

    /// Where to write the winning grid-search configuration.
    #[arg(long, default_value = "data/config.best.json")]
    pub out: PathBuf,
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    print_info(&format!("{}Evaluating scorer against labeled pairs", LOOKING_GLASS));

    let cfg = Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;

    let pool = Pool::new(PoolConfig::builder().db_path(cfg.db_path.clone()).build())
        .await
        .context("opening database")?;
    init_database(&pool).await.context("running migrations")?;
    let repo = SqliteRepository::new(&pool);

    let labels = repo.list_pair_labels().await.context("listing pair labels")?;
    if labels.is_empty() {
        warning("No pair labels found; run `gazetteer seed` first.");
        return Ok(());
    }

    let mut sides: Vec<(AddressRecord, ParsedAddress, AddressRecord, ParsedAddress, u8)> = Vec::with_capacity(labels.len());
    for (rid1, rid2, label) in &labels {
        let (Some(r1), Some(r2)) = (repo.get_record(rid1).await?, repo.get_record(rid2).await?) else {
            warning(&format!("skipping pair ({rid1}, {rid2}): missing record"));
            continue;
        };
        let p1 = repo.get_parsed(rid1).await?.unwrap_or_else(|| ParsedAddress::unparsed(&r1.raw_address));
        let p2 = repo.get_parsed(rid2).await?.unwrap_or_else(|| ParsedAddress::unparsed(&r2.raw_address));
        sides.push((r1, p1, r2, p2, *label));
    }
    let labeled_pairs: Vec<LabeledPair> = sides.iter().map(|(r1, p1, r2, p2, y)| (r1, p1, r2, p2, *y)).collect();

    let current_point = GridPoint {
        weights: cfg.weights.clone(),
        thresholds: cfg.thresholds(),
    };
    let current_metrics = evaluate_point(&current_point, &labeled_pairs);
    info!(?current_metrics, "current configuration metrics");
    println!(
        "current: precision={:.3} recall={:.3} f1={:.3} (tp={} fp={} fn={})",
        current_metrics.precision,
        current_metrics.recall,
        current_metrics.f1,
        current_metrics.true_positives,
        current_metrics.false_positives,
        current_metrics.false_negatives
    );

    if args.current_only {
        return Ok(());
    }

    let points = default_grid_points(&cfg.weights);
    let Some((best_point, best_metrics)) = grid_search(&points, &labeled_pairs) else {
        warning("grid search produced no valid configuration");
        return Ok(());
    };

    println!(
        "best:    precision={:.3} recall={:.3} f1={:.3} thresholds=(same={:.2}, unsure={:.2})",
        best_metrics.precision, best_metrics.recall, best_metrics.f1, best_point.thresholds.same, best_point.thresholds.unsure
    );

    let best_cfg = Config {
        db_path: cfg.db_path.clone(),
        grid_precision: cfg.grid_precision,
        candidate_max: cfg.candidate_max,
        candidate_topn_for_llm: cfg.candidate_topn_for_llm,
        weights: best_point.weights,
        thresholds: gazetteer_core::config::RawThresholds {
            same: best_point.thresholds.same,
            unsure: best_point.thresholds.unsure,
        },
        parser: cfg.parser.clone(),
    };
    let json = serde_json::to_string_pretty(&best_cfg)?;
    std::fs::write(&args.out, json).with_context(|| format!("writing {}", args.out.display()))?;

    success(&format!("Wrote best configuration to {}", args.out.display()));
    Ok(())
}
