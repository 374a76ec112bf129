//! Run configuration: candidate-recall limits, scorer weights and
//! thresholds, and the opaque parser adapter config, loaded from one JSON
//! file (§6). `grid_precision` also governs the alias/anchor lookup and
//! index granularity shared by [`crate::index`] and [`crate::anchor`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::scoring::Thresholds;

/// The JSON-backed run configuration. `parser` is an opaque nested object
/// forwarded verbatim to the parser adapter; the core engine never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub grid_precision: usize,
    pub candidate_max: usize,
    pub candidate_topn_for_llm: usize,
    pub weights: HashMap<String, f64>,
    pub thresholds: RawThresholds,
    #[serde(default)]
    pub parser: Value,
}

/// The wire shape of `thresholds` in the config JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawThresholds {
    pub same: f64,
    pub unsure: f64,
}

impl Config {
    /// Load and validate a configuration file. Missing required keys are a
    /// `serde_json` deserialization failure; an implausible `grid_precision`
    /// is rejected explicitly. Both are fatal, before any pipeline work runs.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.db_path.trim().is_empty() {
            return Err(CoreError::Config("db_path must not be empty".to_string()));
        }
        if self.grid_precision > 12 {
            return Err(CoreError::Config(format!(
                "grid_precision {} is implausibly large for a lat/lon bucket key",
                self.grid_precision
            )));
        }
        Ok(())
    }

    /// The scorer thresholds in [`Thresholds`] form. Note: the runtime does
    /// *not* reject `same <= unsure` here — the scorer still functions, it
    /// just never emits SAME. Only the evaluator's grid search rejects that
    /// combination (§8, "grid-search invariant").
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            same: self.thresholds.same,
            unsure: self.thresholds.unsure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempFile {
        tempfile_path::TempFile::new(contents)
    }

    // A tiny self-contained temp-file helper so this crate does not need a
    // `tempfile` dev-dependency just for one test module.
    mod tempfile_path {
        use std::fs::File;
        use std::io::Write as _;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub struct TempFile {
            path: PathBuf,
        }

        impl TempFile {
            pub fn new(contents: &str) -> Self {
                let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut path = std::env::temp_dir();
                path.push(format!(
                    "gazetteer-core-config-test-{}-{unique}.json",
                    std::process::id()
                ));
                let mut f = File::create(&path).unwrap();
                f.write_all(contents.as_bytes()).unwrap();
                TempFile { path }
            }

            pub fn path(&self) -> &PathBuf {
                &self.path
            }
        }

        impl Drop for TempFile {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn loads_a_well_formed_config() {
        let json = r#"{
            "db_path": "gazetteer.sqlite",
            "grid_precision": 4,
            "candidate_max": 50,
            "candidate_topn_for_llm": 5,
            "weights": {"district": 1.0, "aoi": 1.2},
            "thresholds": {"same": 0.78, "unsure": 0.55},
            "parser": {"model": "gpt-4o-mini"}
        }"#;
        let tmp = write_temp(json);
        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.db_path, "gazetteer.sqlite");
        assert_eq!(cfg.grid_precision, 4);
        assert_eq!(cfg.thresholds().same, 0.78);
    }

    #[test]
    fn missing_required_key_is_a_fatal_error() {
        let json = r#"{"db_path": "x.sqlite"}"#;
        let tmp = write_temp(json);
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn implausible_grid_precision_is_rejected() {
        let json = r#"{
            "db_path": "x.sqlite",
            "grid_precision": 99,
            "candidate_max": 50,
            "candidate_topn_for_llm": 5,
            "weights": {},
            "thresholds": {"same": 0.78, "unsure": 0.55}
        }"#;
        let tmp = write_temp(json);
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn runtime_accepts_inverted_thresholds_without_rejecting() {
        let json = r#"{
            "db_path": "x.sqlite",
            "grid_precision": 4,
            "candidate_max": 50,
            "candidate_topn_for_llm": 5,
            "weights": {},
            "thresholds": {"same": 0.4, "unsure": 0.6}
        }"#;
        let tmp = write_temp(json);
        let cfg = Config::load(tmp.path()).unwrap();
        assert!(cfg.thresholds().same < cfg.thresholds().unsure);
    }
}
