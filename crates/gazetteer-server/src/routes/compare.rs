//! The `/compare` endpoint: a stateless, one-shot comparison of two free-text
//! addresses.

use axum::{extract::State, routing::post, Json, Router};
use gazetteer_core::model::{Decision, ParsedAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{error::ServerResult, state::AppState, ServerError};

/// Build the comparison route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/compare", post(compare))
}

/// Request body for `POST /compare`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CompareRequest {
    /// First free-text address.
    pub addr1: String,
    /// Second free-text address.
    pub addr2: String,
    /// Whether to consult the LLM judge as a tiebreak. Defaults to `false`.
    #[serde(default)]
    pub use_llm: bool,
}

/// SAME / UNSURE / DIFFERENT, mirrored here so the OpenAPI schema doesn't
/// reach into the engine crate.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionDto {
    Same,
    Unsure,
    Different,
}

impl From<Decision> for DecisionDto {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Same => DecisionDto::Same,
            Decision::Unsure => DecisionDto::Unsure,
            Decision::Different => DecisionDto::Different,
        }
    }
}

/// The structured fields extracted from one side of a comparison.
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct ParsedAddressDto {
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
    pub intersection: Option<(String, String)>,
    pub direction: Option<String>,
    pub distance_m: Option<i64>,
}

impl From<ParsedAddress> for ParsedAddressDto {
    fn from(p: ParsedAddress) -> Self {
        ParsedAddressDto {
            norm_text: p.norm_text,
            province: p.province,
            city: p.city,
            district: p.district,
            street: p.street,
            road: p.road,
            road_no: p.road_no,
            aoi: p.aoi,
            building: p.building,
            unit: p.unit,
            floor: p.floor,
            room: p.room,
            shop_name: p.shop_name,
            intersection: p.intersection,
            direction: p.direction,
            distance_m: p.distance_m,
        }
    }
}

/// Response body for `POST /compare`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CompareResponse {
    pub decision: DecisionDto,
    pub score: f64,
    pub feature_scores: HashMap<String, f64>,
    pub evidence: HashMap<String, serde_json::Value>,
    pub addr1_parsed: ParsedAddressDto,
    pub addr2_parsed: ParsedAddressDto,
    pub use_llm: bool,
}

/// Compare two addresses and report whether they describe the same entity.
#[utoipa::path(
    post,
    path = "/compare",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "Comparison verdict", body = CompareResponse),
        (status = 400, description = "Empty addr1 or addr2")
    ),
    tag = "Compare"
)]
pub(crate) async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> ServerResult<Json<CompareResponse>> {
    let addr1 = request.addr1.trim();
    let addr2 = request.addr2.trim();

    if addr1.is_empty() || addr2.is_empty() {
        return Err(ServerError::BadRequest("addr1 and addr2 must not be empty".to_string()));
    }

    let outcome = state.pipeline.compare_pair(addr1, addr2, request.use_llm).await?;

    Ok(Json(CompareResponse {
        decision: outcome.result.decision.into(),
        score: outcome.result.score,
        feature_scores: outcome.result.feature_scores,
        evidence: outcome.result.evidence,
        addr1_parsed: outcome.addr1_parsed.into(),
        addr2_parsed: outcome.addr2_parsed.into(),
        use_llm: request.use_llm,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_builds_without_panicking() {
        let _router = routes();
    }

    #[test]
    fn decision_dto_maps_variants() {
        assert!(matches!(DecisionDto::from(Decision::Same), DecisionDto::Same));
        assert!(matches!(DecisionDto::from(Decision::Different), DecisionDto::Different));
    }
}
