//! The resolution pipeline: ingest, parse-or-reuse, canonicalize,
//! conflict-check, index, per-record recall + score + judge, union, and
//! emit clusters plus a match log (§4.J).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::anchor::resolve_anchor_bucket;
use crate::canonicalize::Canonicalizer;
use crate::conflict::ConflictChecker;
use crate::error::CoreResult;
use crate::index::CandidateIndex;
use crate::judge::{CandidatePair, Judge, LlmArbitrator};
use crate::model::{AddressRecord, Cluster, Decision, MatchResult, ParsedAddress};
use crate::parser::AddressParser;
use crate::repository::{MatchLogEntry, Repository};
use crate::scoring::Scorer;
use crate::unionfind::UnionFind;

/// Summary returned to callers after a full pipeline run (§7, "user-visible
/// behavior").
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub n_records: usize,
    pub n_conflicts: usize,
    pub n_clusters_gt1: usize,
}

/// Result of [`Pipeline::compare_pair`]: the judge's verdict plus both
/// addresses as parsed, for callers (the HTTP façade) that need to echo the
/// structured form back alongside the decision.
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    pub result: MatchResult,
    pub addr1_parsed: ParsedAddress,
    pub addr2_parsed: ParsedAddress,
}

/// Orchestrates one complete resolution run over a repository's records.
///
/// The pipeline is a plain value: every collaborator (repository, parser,
/// canonicalizer, scorer, optional LLM arbitrator) is passed in explicitly
/// at construction, so a run is fully reproducible from its inputs.
pub struct Pipeline {
    repo: Arc<dyn Repository>,
    parser: Arc<dyn AddressParser>,
    canonicalizer: Canonicalizer,
    scorer: Scorer,
    llm: Option<Arc<dyn LlmArbitrator>>,
    grid_precision: usize,
    candidate_max: usize,
    candidate_topn_for_llm: usize,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn Repository>,
        parser: Arc<dyn AddressParser>,
        canonicalizer: Canonicalizer,
        scorer: Scorer,
        llm: Option<Arc<dyn LlmArbitrator>>,
        grid_precision: usize,
        candidate_max: usize,
        candidate_topn_for_llm: usize,
    ) -> Self {
        Pipeline {
            repo,
            parser,
            canonicalizer,
            scorer,
            llm,
            grid_precision,
            candidate_max,
            candidate_topn_for_llm,
        }
    }

    /// Run the full pipeline. `use_llm` is threaded through to the judge for
    /// every record processed in this run (§9's open-question resolution:
    /// never stored as constructor state).
    pub async fn run(&self, use_llm: bool) -> CoreResult<PipelineSummary> {
        let records = self.repo.list_records().await?;
        info!(n = records.len(), "loaded records for resolution run");

        let mut parsed_by_rid: HashMap<String, ParsedAddress> = HashMap::new();
        let mut n_conflicts = 0usize;

        for rec in &records {
            let parsed = match self.repo.get_parsed(&rec.rid).await? {
                Some(p) => p,
                None => {
                    let mut p = match self.parser.parse(&rec.raw_address).await {
                        Ok(p) => p,
                        Err(err) => {
                            warn!(rid = %rec.rid, error = %err, "address parse failed, treating as unparsed");
                            ParsedAddress::unparsed(rec.raw_address.clone())
                        }
                    };
                    self.canonicalizer.canonicalize(&mut p);
                    self.repo.upsert_parsed(&rec.rid, &p).await?;
                    p
                }
            };

            let conflicts = ConflictChecker::check_record(rec, &parsed);
            if !conflicts.is_empty() {
                n_conflicts += conflicts.len();
                self.repo.insert_conflicts(&conflicts).await?;
            }
            parsed_by_rid.insert(rec.rid.clone(), parsed);
        }

        let mut index = CandidateIndex::new(self.grid_precision);
        for rec in &records {
            index.index_record(rec, &parsed_by_rid[&rec.rid]);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut uf = UnionFind::new(records.iter().map(|r| r.rid.clone()));

        for rec in &records {
            let parsed = parsed_by_rid[&rec.rid].clone();
            let anchor_bucket = resolve_anchor_bucket(self.repo.as_ref(), &index, &parsed).await?;

            let cand_rids = index.candidates_for(rec, &parsed, &seen, anchor_bucket.as_deref(), self.candidate_max);
            if cand_rids.is_empty() {
                seen.insert(rec.rid.clone());
                continue;
            }

            let mut cand_records: Vec<(AddressRecord, ParsedAddress)> = Vec::with_capacity(cand_rids.len());
            for cid in &cand_rids {
                if let Some(crec) = self.repo.get_record(cid).await? {
                    let cparsed = parsed_by_rid.get(cid).cloned().unwrap_or_default();
                    cand_records.push((crec, cparsed));
                }
            }

            let mut scored: Vec<(AddressRecord, ParsedAddress, MatchResult)> = Vec::with_capacity(cand_records.len());
            for (crec, cparsed) in cand_records {
                let bonus = match (&anchor_bucket, crec.lat, crec.lon) {
                    (Some(ab), Some(lat), Some(lon)) => {
                        if index.neighborhood_contains(ab, &index.geo_bucket(lat, lon)) {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    _ => 0.0,
                };
                let result = self.scorer.score_pair(rec, &parsed, &crec, &cparsed, bonus);
                scored.push((crec, cparsed, result));
            }

            scored.sort_by(|a, b| {
                b.2.score
                    .partial_cmp(&a.2.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.rid.cmp(&b.0.rid))
            });
            scored.truncate(self.candidate_topn_for_llm);

            let candidate_pairs: Vec<CandidatePair> = scored
                .iter()
                .map(|(crec, cparsed, result)| CandidatePair {
                    rec: crec,
                    parsed: cparsed,
                    pre_score: result.clone(),
                })
                .collect();

            let llm_ref: Option<&dyn LlmArbitrator> = if use_llm { self.llm.as_deref() } else { None };
            let final_result = Judge::judge((rec, &parsed), &candidate_pairs, llm_ref).await;

            if final_result.decision == Decision::Same {
                let best_rid = final_result
                    .evidence
                    .get("best_rid")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .or_else(|| candidate_pairs.first().map(|c| c.rec.rid.clone()));
                if let Some(best_rid) = best_rid {
                    uf.union(&rec.rid, &best_rid);
                }
            }

            let pre_scores: Vec<MatchResult> = scored.iter().map(|(_, _, r)| r.clone()).collect();
            self.repo
                .insert_match_log(&MatchLogEntry {
                    rid_query: rec.rid.clone(),
                    candidate_rids: cand_rids.clone(),
                    pre_scores,
                    final_result,
                })
                .await?;

            seen.insert(rec.rid.clone());
        }

        let groups = uf.groups();
        let clusters: Vec<Cluster> = groups
            .into_iter()
            .map(|(root, members)| Cluster {
                cluster_id: format!("cluster_{root}"),
                members,
            })
            .collect();
        let n_clusters_gt1 = clusters.iter().filter(|c| c.members.len() > 1).count();
        self.repo.write_clusters(&clusters).await?;

        Ok(PipelineSummary {
            n_records: records.len(),
            n_conflicts,
            n_clusters_gt1,
        })
    }

    /// A stateless one-shot comparison: parse both addresses, canonicalize,
    /// score once, and return the judge's verdict — with empty indexes, no
    /// anchor bucket, and a single-element candidate list.
    pub async fn compare_pair(&self, addr1: &str, addr2: &str, use_llm: bool) -> CoreResult<CompareOutcome> {
        let rec1 = AddressRecord::ad_hoc("addr1", addr1);
        let rec2 = AddressRecord::ad_hoc("addr2", addr2);

        let mut p1 = self
            .parser
            .parse(addr1)
            .await
            .unwrap_or_else(|_| ParsedAddress::unparsed(addr1));
        let mut p2 = self
            .parser
            .parse(addr2)
            .await
            .unwrap_or_else(|_| ParsedAddress::unparsed(addr2));
        self.canonicalizer.canonicalize(&mut p1);
        self.canonicalizer.canonicalize(&mut p2);

        let pre_score = self.scorer.score_pair(&rec1, &p1, &rec2, &p2, 0.0);
        let candidates = vec![CandidatePair {
            rec: &rec2,
            parsed: &p2,
            pre_score,
        }];

        let llm_ref: Option<&dyn LlmArbitrator> = if use_llm { self.llm.as_deref() } else { None };
        let result = Judge::judge((&rec1, &p1), &candidates, llm_ref).await;
        Ok(CompareOutcome { result, addr1_parsed: p1, addr2_parsed: p2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasMap;
    use crate::model::AliasFile;
    use crate::repository::tests::InMemoryRepository;
    use crate::scoring::{default_thresholds, default_weights};
    use async_trait::async_trait;

    struct FixedParser(HashMap<String, ParsedAddress>);

    #[async_trait]
    impl AddressParser for FixedParser {
        async fn parse(&self, raw: &str) -> CoreResult<ParsedAddress> {
            Ok(self.0.get(raw).cloned().unwrap_or_else(|| ParsedAddress::unparsed(raw)))
        }
    }

    fn rec(rid: &str, raw: &str) -> AddressRecord {
        AddressRecord {
            rid: rid.to_string(),
            source: "test".to_string(),
            raw_address: raw.to_string(),
            district_claim: None,
            grid_district: None,
            lat: None,
            lon: None,
            extra: Default::default(),
        }
    }

    fn pipeline(repo: Arc<InMemoryRepository>, parsed_map: HashMap<String, ParsedAddress>) -> Pipeline {
        Pipeline::new(
            repo,
            Arc::new(FixedParser(parsed_map)),
            Canonicalizer::new(
                AliasMap::from_canonical_map(&AliasFile::new()),
                AliasMap::from_canonical_map(&AliasFile::new()),
            ),
            Scorer::new(default_weights(), default_thresholds()),
            None,
            4,
            50,
            5,
        )
    }

    #[tokio::test]
    async fn transitive_chain_clusters_three_records_via_shared_building() {
        let repo = Arc::new(InMemoryRepository::default());
        repo.records.lock().unwrap().push(rec("a", "addr-a"));
        repo.records.lock().unwrap().push(rec("b", "addr-b"));
        repo.records.lock().unwrap().push(rec("c", "addr-c"));

        let mut shared = ParsedAddress::unparsed("shared");
        shared.building = Some("F9A".to_string());
        shared.floor = Some("2".to_string());
        shared.room = Some("203".to_string());

        let mut parsed_map = HashMap::new();
        parsed_map.insert("addr-a".to_string(), shared.clone());
        parsed_map.insert("addr-b".to_string(), shared.clone());
        parsed_map.insert("addr-c".to_string(), shared);

        let pipe = pipeline(repo.clone(), parsed_map);
        let summary = pipe.run(false).await.unwrap();

        assert_eq!(summary.n_records, 3);
        assert_eq!(summary.n_clusters_gt1, 1);
    }

    #[tokio::test]
    async fn unrelated_records_stay_in_separate_clusters() {
        let repo = Arc::new(InMemoryRepository::default());
        repo.records.lock().unwrap().push(rec("a", "addr-a"));
        repo.records.lock().unwrap().push(rec("b", "addr-b"));

        let mut pa = ParsedAddress::unparsed("a");
        pa.building = Some("F9A".to_string());
        let mut pb = ParsedAddress::unparsed("b");
        pb.building = Some("Z1".to_string());

        let mut parsed_map = HashMap::new();
        parsed_map.insert("addr-a".to_string(), pa);
        parsed_map.insert("addr-b".to_string(), pb);

        let pipe = pipeline(repo.clone(), parsed_map);
        let summary = pipe.run(false).await.unwrap();
        assert_eq!(summary.n_clusters_gt1, 0);
    }

    #[tokio::test]
    async fn compare_pair_returns_a_verdict_with_no_persisted_state() {
        let repo = Arc::new(InMemoryRepository::default());
        let pipe = pipeline(repo, HashMap::new());
        let outcome = pipe.compare_pair("合肥市蜀山区创新大道100号", "合肥市蜀山区创新大道100号", false).await.unwrap();
        assert!(matches!(outcome.result.decision, Decision::Same | Decision::Unsure | Decision::Different));
    }
}
