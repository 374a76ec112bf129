//! Core data model: address records, parsed addresses, match results,
//! conflicts, clusters, pair labels, and geographic anchors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw address submission as it arrives from a source system.
///
/// `district_claim` is whatever the submitting system asserts the district
/// to be; `grid_district` is whatever a geofencing grid independently
/// derived from `lat`/`lon`. The two are allowed to disagree — that
/// disagreement is exactly what [`crate::conflict::ConflictChecker`] looks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddressRecord {
    pub rid: String,
    pub source: String,
    pub raw_address: String,
    pub district_claim: Option<String>,
    pub grid_district: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl AddressRecord {
    /// Construct a minimal record for ad-hoc comparisons (e.g. the `/compare`
    /// endpoint), where only the raw text and a synthetic rid are known.
    pub fn ad_hoc(rid: impl Into<String>, raw_address: impl Into<String>) -> Self {
        AddressRecord {
            rid: rid.into(),
            source: "api".to_string(),
            raw_address: raw_address.into(),
            district_claim: None,
            grid_district: None,
            lat: None,
            lon: None,
            extra: HashMap::new(),
        }
    }
}

/// The structured fields a parser extracted from [`AddressRecord::raw_address`].
///
/// Every field besides `norm_text` is optional: a parser that could not
/// find a piece of information leaves it absent rather than guessing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedAddress {
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
    /// The two named features of a street intersection, e.g. `("科学大道", "天波路")`.
    pub intersection: Option<(String, String)>,
    pub direction: Option<String>,
    pub distance_m: Option<i64>,
}

impl ParsedAddress {
    /// Build an empty parsed address carrying only the normalized text,
    /// used when a parse attempt failed and every structured field is absent.
    pub fn unparsed(norm_text: impl Into<String>) -> Self {
        ParsedAddress {
            norm_text: norm_text.into(),
            ..Default::default()
        }
    }
}

/// The tri-valued outcome of comparing two addresses (or scoring one
/// candidate against a query), plus the evidence behind the call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub decision: Decision,
    pub score: f64,
    pub feature_scores: HashMap<String, f64>,
    pub evidence: HashMap<String, Value>,
}

impl MatchResult {
    pub fn different_empty(reason: &'static str, detail: impl Into<Value>) -> Self {
        let mut evidence = HashMap::new();
        evidence.insert("judge".to_string(), Value::String(reason.to_string()));
        evidence.insert("reason".to_string(), detail.into());
        MatchResult {
            decision: Decision::Different,
            score: 0.0,
            feature_scores: HashMap::new(),
            evidence,
        }
    }
}

/// SAME / UNSURE / DIFFERENT — the decision category a score threshold maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Same,
    Unsure,
    Different,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Same => "SAME",
            Decision::Unsure => "UNSURE",
            Decision::Different => "DIFFERENT",
        };
        f.write_str(s)
    }
}

/// A data-quality issue found on a single record, or between a pair of
/// records under consideration as the same entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    pub rid: String,
    pub conflict_type: String,
    pub detail: String,
}

/// A group of record ids the union-find pass has decided describe the same
/// real-world entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    pub cluster_id: String,
    pub members: Vec<String>,
}

/// A human-supplied ground-truth label for a record pair, used by the
/// evaluator (1 = same entity, 0 = different entities).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairLabel<'a> {
    pub rid1: &'a str,
    pub rid2: &'a str,
    pub label: u8,
}

/// A geographic reference point used to resolve relative descriptions like
/// "100m southeast of the X/Y intersection" into a concrete location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anchor {
    pub anchor_id: String,
    pub anchor_type: Option<String>,
    pub key_text: String,
    pub district: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// A bidirectional alias file: canonical name to its list of known aliases.
pub type AliasFile = HashMap<String, Vec<String>>;
