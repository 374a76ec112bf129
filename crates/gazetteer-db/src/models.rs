//! Row structs for the nine logical tables the resolution engine reads
//! and writes (§6): address records, parsed addresses, reference data
//! (roads/POIs/anchors), conflicts, match logs, clusters, and pair labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `address_records` — a raw input row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AddressRecordRow {
    pub rid: String,
    pub source: String,
    pub raw_address: String,
    pub district_claim: Option<String>,
    pub grid_district: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub extra_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `parsed_addresses` — the structured decomposition the parser produced
/// for one record, cached across runs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParsedAddressRow {
    pub rid: String,
    pub norm_text: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,
    pub road: Option<String>,
    pub road_no: Option<String>,
    pub aoi: Option<String>,
    pub building: Option<String>,
    pub unit: Option<String>,
    pub floor: Option<String>,
    pub room: Option<String>,
    pub shop_name: Option<String>,
    /// JSON-encoded `[road_a, road_b]`, or absent.
    pub intersection_json: Option<String>,
    pub direction: Option<String>,
    pub distance_m: Option<i64>,
    pub parsed_at: DateTime<Utc>,
}

/// `roads` — a named road, optionally carrying its own alias list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadRow {
    pub road_id: String,
    pub name: String,
    pub district: Option<String>,
    pub aliases_json: Option<String>,
}

/// `pois` — a named point of interest with coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PoiRow {
    pub poi_id: String,
    pub name: String,
    pub poi_type: Option<String>,
    pub district: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub aliases_json: Option<String>,
}

/// `anchors` — a geographic reference point (intersection or POI) keyed by
/// its lookup text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnchorRow {
    pub anchor_id: String,
    pub anchor_type: Option<String>,
    pub key_text: String,
    pub district: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// `conflicts` — a data-quality issue found on a single record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConflictRow {
    pub id: i64,
    pub rid: String,
    pub conflict_type: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// `match_logs` — one record's candidate comparison and final verdict.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchLogRow {
    pub id: i64,
    pub rid_query: String,
    pub candidate_rids_json: String,
    pub pre_scores_json: String,
    pub final_json: String,
    pub created_at: DateTime<Utc>,
}

/// `clusters` — one membership row (cluster_id, rid).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClusterRow {
    pub cluster_id: String,
    pub rid: String,
}

/// `pair_labels` — a human-supplied ground-truth label for a record pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PairLabelRow {
    pub id: i64,
    pub rid1: String,
    pub rid2: String,
    pub label: i64,
}
