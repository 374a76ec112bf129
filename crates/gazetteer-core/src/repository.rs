//! The `Repository` trait: the seam between the resolution engine and
//! whatever keyed row store backs it. `gazetteer-db` provides the concrete
//! SQLite-backed implementation; tests and the `/compare` one-shot path can
//! supply a lighter in-memory fake.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::model::{AddressRecord, Anchor, Cluster, Conflict, MatchResult, ParsedAddress};

/// A single row of the `match_logs` table: the query record, the ranked
/// candidates considered, their pre-judge scores, and the final verdict.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MatchLogEntry {
    pub rid_query: String,
    pub candidate_rids: Vec<String>,
    pub pre_scores: Vec<MatchResult>,
    pub final_result: MatchResult,
}

/// Tabular persistence for address records, their parses, reference data
/// (roads/POIs/anchors), conflicts, match logs, clusters, and pair labels.
///
/// Implementors own the on-disk format; the engine only ever sees these nine
/// logical tables.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All address records, in load order (oldest `created_at` first).
    async fn list_records(&self) -> CoreResult<Vec<AddressRecord>>;

    /// A single record by id.
    async fn get_record(&self, rid: &str) -> CoreResult<Option<AddressRecord>>;

    /// The cached parse for a record, if one was already stored.
    async fn get_parsed(&self, rid: &str) -> CoreResult<Option<ParsedAddress>>;

    /// Cache a freshly computed parse for a record.
    async fn upsert_parsed(&self, rid: &str, parsed: &ParsedAddress) -> CoreResult<()>;

    /// Record data-quality conflicts found during the conflict-checking pass.
    async fn insert_conflicts(&self, conflicts: &[Conflict]) -> CoreResult<()>;

    /// Append a match-log row describing one record's candidate comparison.
    async fn insert_match_log(&self, entry: &MatchLogEntry) -> CoreResult<()>;

    /// Overwrite the `clusters` table with the final union-find groups.
    async fn write_clusters(&self, clusters: &[Cluster]) -> CoreResult<()>;

    /// Look up a geographic anchor (intersection or POI) by its key text.
    async fn find_anchor_by_key(&self, key_text: &str) -> CoreResult<Option<Anchor>>;

    /// All human-labeled record pairs, used by the evaluator.
    async fn list_pair_labels(&self) -> CoreResult<Vec<(String, String, u8)>>;
}
