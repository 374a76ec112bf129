//! Post-scoring arbitration: a district-conflict blacklist filter, a
//! strong-field whitelist shortcut, an optional LLM tiebreak, and a fallback
//! to the best pre-score candidate.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::conflict::ConflictChecker;
use crate::model::{AddressRecord, Decision, MatchResult, ParsedAddress};
use crate::text::jaccard_sim;

/// One ranked candidate under consideration, carrying its pre-judge score.
#[derive(Debug, Clone)]
pub struct CandidatePair<'a> {
    pub rec: &'a AddressRecord,
    pub parsed: &'a ParsedAddress,
    pub pre_score: MatchResult,
}

/// The verdict an LLM tiebreak collaborator returns for one query plus its
/// ranked candidates.
#[derive(Debug, Clone)]
pub struct LlmVerdict {
    pub decision: Decision,
    /// Index into the candidates slice the LLM selected as best, if any.
    pub best_idx: Option<usize>,
    pub score: f64,
    pub reason: String,
}

/// The seam to an LLM-backed tiebreak call. `gazetteer-parser` provides the
/// concrete OpenAI-compatible implementation.
#[async_trait]
pub trait LlmArbitrator: Send + Sync {
    async fn arbitrate(
        &self,
        query: (&AddressRecord, &ParsedAddress),
        candidates: &[CandidatePair<'_>],
    ) -> crate::error::CoreResult<LlmVerdict>;
}

/// Stateless decision-chain arbitrator.
pub struct Judge;

impl Judge {
    /// Run the blacklist/whitelist/LLM/fallback chain over `candidates`,
    /// which must already be ranked in pre-score-descending order.
    pub async fn judge(
        query: (&AddressRecord, &ParsedAddress),
        candidates: &[CandidatePair<'_>],
        llm: Option<&dyn LlmArbitrator>,
    ) -> MatchResult {
        let (qrec, qparsed) = query;

        let mut best: Option<&CandidatePair> = None;
        let mut blacklist_reason: Option<String> = None;
        let mut any_blacklisted = false;

        for cand in candidates {
            if let Some(reason) = ConflictChecker::pair_conflict(qrec, qparsed, cand.rec, cand.parsed) {
                any_blacklisted = true;
                blacklist_reason.get_or_insert(reason);
                continue;
            }

            let building_ok = fields_equal_ci(&qparsed.building, &cand.parsed.building);
            let floor_ok = fields_equal(&qparsed.floor, &cand.parsed.floor);
            let room_ok = fields_equal(&qparsed.room, &cand.parsed.room);
            let aoi_ok = match (&qparsed.aoi, &cand.parsed.aoi) {
                (Some(a), Some(b)) => jaccard_sim(a, b, 2) >= 0.65,
                _ => false,
            };
            let geo_ok = cand.pre_score.feature_scores.get("geo").copied().unwrap_or(0.0) >= 0.7;

            if building_ok && floor_ok && (room_ok || geo_ok || aoi_ok) {
                let mut evidence = HashMap::new();
                evidence.insert("judge".to_string(), Value::String("rule_whitelist".to_string()));
                evidence.insert("best_rid".to_string(), Value::String(cand.rec.rid.clone()));
                return MatchResult {
                    decision: Decision::Same,
                    score: cand.pre_score.score.max(0.90),
                    feature_scores: cand.pre_score.feature_scores.clone(),
                    evidence,
                };
            }

            if best.is_none() {
                best = Some(cand);
            }
        }

        if let Some(arbitrator) = llm {
            if !candidates.is_empty() {
                match arbitrator.arbitrate(query, candidates).await {
                    Ok(verdict) => return resolve_llm_verdict(qrec, qparsed, candidates, verdict, &blacklist_reason),
                    Err(err) => {
                        warn!(error = %err, "LLM arbitrator failed, falling back to best pre-score");
                    }
                }
            }
        }

        if let Some(cand) = best {
            let mut evidence = cand.pre_score.evidence.clone();
            evidence.insert("judge".to_string(), Value::String("best_prescore".to_string()));
            evidence.insert("best_rid".to_string(), Value::String(cand.rec.rid.clone()));
            return MatchResult {
                decision: cand.pre_score.decision,
                score: cand.pre_score.score,
                feature_scores: cand.pre_score.feature_scores.clone(),
                evidence,
            };
        }

        if any_blacklisted {
            return blacklisted_result(blacklist_reason.unwrap_or_else(|| "all candidates conflicted".to_string()));
        }

        let mut evidence = HashMap::new();
        evidence.insert("judge".to_string(), Value::String("empty_candidates".to_string()));
        MatchResult {
            decision: Decision::Different,
            score: 0.0,
            feature_scores: HashMap::new(),
            evidence,
        }
    }
}

fn resolve_llm_verdict(
    qrec: &AddressRecord,
    qparsed: &ParsedAddress,
    candidates: &[CandidatePair<'_>],
    verdict: LlmVerdict,
    blacklist_reason: &Option<String>,
) -> MatchResult {
    if verdict.decision == Decision::Same {
        if let Some(cand) = verdict.best_idx.and_then(|i| candidates.get(i)) {
            if ConflictChecker::pair_conflict(qrec, qparsed, cand.rec, cand.parsed).is_some() {
                return blacklisted_result(
                    blacklist_reason
                        .clone()
                        .unwrap_or_else(|| "LLM-chosen candidate conflicts on district".to_string()),
                );
            }
        }
    }

    let mut evidence = HashMap::new();
    evidence.insert("judge".to_string(), Value::String("llm".to_string()));
    evidence.insert("reason".to_string(), Value::String(verdict.reason));
    if let Some(cand) = verdict.best_idx.and_then(|i| candidates.get(i)) {
        evidence.insert("best_rid".to_string(), Value::String(cand.rec.rid.clone()));
    }
    MatchResult {
        decision: verdict.decision,
        score: verdict.score,
        feature_scores: HashMap::new(),
        evidence,
    }
}

fn blacklisted_result(reason: String) -> MatchResult {
    let mut evidence = HashMap::new();
    evidence.insert("judge".to_string(), Value::String("blacklist".to_string()));
    evidence.insert("reason".to_string(), Value::String(reason));
    MatchResult {
        decision: Decision::Different,
        score: 0.0,
        feature_scores: HashMap::new(),
        evidence,
    }
}

fn fields_equal(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn fields_equal_ci(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x.eq_ignore_ascii_case(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{default_thresholds, default_weights, Scorer};

    fn rec(rid: &str) -> AddressRecord {
        AddressRecord {
            rid: rid.to_string(),
            source: "test".to_string(),
            raw_address: String::new(),
            district_claim: None,
            grid_district: None,
            lat: None,
            lon: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn whitelist_fires_on_building_floor_and_room() {
        let qrec = rec("q");
        let mut qparsed = ParsedAddress::unparsed("q");
        qparsed.building = Some("F9A".to_string());
        qparsed.floor = Some("2".to_string());
        qparsed.room = Some("203".to_string());

        let crec = rec("c1");
        let cparsed = qparsed.clone();

        let scorer = Scorer::new(default_weights(), default_thresholds());
        let pre_score = scorer.score_pair(&qrec, &qparsed, &crec, &cparsed, 0.0);
        let candidates = vec![CandidatePair { rec: &crec, parsed: &cparsed, pre_score }];

        let result = Judge::judge((&qrec, &qparsed), &candidates, None).await;
        assert_eq!(result.decision, Decision::Same);
        assert!(result.score >= 0.90);
        assert_eq!(
            result.evidence.get("judge").and_then(|v| v.as_str()),
            Some("rule_whitelist")
        );
    }

    #[tokio::test]
    async fn district_conflict_blacklists_an_otherwise_strong_match() {
        let mut qrec = rec("q");
        qrec.district_claim = Some("蜀山区".to_string());
        let mut qparsed = ParsedAddress::unparsed("q");
        qparsed.building = Some("F9A".to_string());
        qparsed.floor = Some("2".to_string());
        qparsed.room = Some("203".to_string());

        let mut crec = rec("c1");
        crec.district_claim = Some("瑶海区".to_string());
        let cparsed = qparsed.clone();

        let scorer = Scorer::new(default_weights(), default_thresholds());
        let pre_score = scorer.score_pair(&qrec, &qparsed, &crec, &cparsed, 0.0);
        let candidates = vec![CandidatePair { rec: &crec, parsed: &cparsed, pre_score }];

        let result = Judge::judge((&qrec, &qparsed), &candidates, None).await;
        assert_eq!(result.decision, Decision::Different);
        assert_eq!(
            result.evidence.get("judge").and_then(|v| v.as_str()),
            Some("blacklist")
        );
    }

    #[tokio::test]
    async fn empty_candidates_yields_empty_candidates_evidence() {
        let qrec = rec("q");
        let qparsed = ParsedAddress::unparsed("q");
        let candidates: Vec<CandidatePair> = vec![];
        let result = Judge::judge((&qrec, &qparsed), &candidates, None).await;
        assert_eq!(result.decision, Decision::Different);
        assert_eq!(
            result.evidence.get("judge").and_then(|v| v.as_str()),
            Some("empty_candidates")
        );
    }

    #[tokio::test]
    async fn falls_back_to_best_prescore_when_no_rule_fires() {
        let qrec = rec("q");
        let mut qparsed = ParsedAddress::unparsed("q");
        qparsed.aoi = Some("创新园".to_string());

        let crec = rec("c1");
        let mut cparsed = ParsedAddress::unparsed("c1");
        cparsed.aoi = Some("创新广场".to_string());

        let scorer = Scorer::new(default_weights(), default_thresholds());
        let pre_score = scorer.score_pair(&qrec, &qparsed, &crec, &cparsed, 0.0);
        let expected_decision = pre_score.decision;
        let candidates = vec![CandidatePair { rec: &crec, parsed: &cparsed, pre_score }];

        let result = Judge::judge((&qrec, &qparsed), &candidates, None).await;
        assert_eq!(result.decision, expected_decision);
        assert_eq!(
            result.evidence.get("judge").and_then(|v| v.as_str()),
            Some("best_prescore")
        );
    }
}
