//! Data-quality conflict detection: per-record mismatches between a claimed
//! or grid-derived district and the parsed district, and the pairwise
//! district disagreement the judge's blacklist rule relies on.

use crate::model::{AddressRecord, Conflict, ParsedAddress};

/// Finds administrative-area disagreements, both within a single record and
/// between a candidate pair under consideration by the judge.
pub struct ConflictChecker;

impl ConflictChecker {
    /// Per-record conflicts: grid-derived district vs. parsed district, and
    /// claimed district vs. parsed district. Either, both, or neither may
    /// fire depending on which fields are present.
    pub fn check_record(rec: &AddressRecord, parsed: &ParsedAddress) -> Vec<Conflict> {
        let mut out = Vec::new();

        if let (Some(grid), Some(district)) = (&rec.grid_district, &parsed.district) {
            if grid != district {
                out.push(Conflict {
                    rid: rec.rid.clone(),
                    conflict_type: "GRID_DISTRICT_MISMATCH".to_string(),
                    detail: format!("grid_district={grid} parsed_district={district}"),
                });
            }
        }

        if let (Some(claim), Some(district)) = (&rec.district_claim, &parsed.district) {
            if claim != district {
                out.push(Conflict {
                    rid: rec.rid.clone(),
                    conflict_type: "CLAIM_DISTRICT_MISMATCH".to_string(),
                    detail: format!("district_claim={claim} parsed_district={district}"),
                });
            }
        }

        out
    }

    /// The first district-level disagreement between two records, checked in
    /// order: grid vs. grid, claim vs. claim, parsed vs. parsed. `None` if
    /// every comparable pair agrees (fields missing on either side are
    /// skipped, not treated as a conflict).
    pub fn pair_conflict(
        r1: &AddressRecord,
        p1: &ParsedAddress,
        r2: &AddressRecord,
        p2: &ParsedAddress,
    ) -> Option<String> {
        if let (Some(a), Some(b)) = (&r1.grid_district, &r2.grid_district) {
            if a != b {
                return Some(format!("grid_district differs: {a} vs {b}"));
            }
        }
        if let (Some(a), Some(b)) = (&r1.district_claim, &r2.district_claim) {
            if a != b {
                return Some(format!("district_claim differs: {a} vs {b}"));
            }
        }
        if let (Some(a), Some(b)) = (&p1.district, &p2.district) {
            if a != b {
                return Some(format!("parsed district differs: {a} vs {b}"));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(rid: &str, grid: Option<&str>, claim: Option<&str>) -> AddressRecord {
        AddressRecord {
            rid: rid.to_string(),
            source: "test".to_string(),
            raw_address: String::new(),
            district_claim: claim.map(str::to_string),
            grid_district: grid.map(str::to_string),
            lat: None,
            lon: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn grid_mismatch_is_detected() {
        let r = rec("a", Some("蜀山区"), None);
        let mut p = ParsedAddress::unparsed("a");
        p.district = Some("包河区".to_string());
        let conflicts = ConflictChecker::check_record(&r, &p);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, "GRID_DISTRICT_MISMATCH");
    }

    #[test]
    fn claim_mismatch_is_detected_independently() {
        let r = rec("a", None, Some("瑶海区"));
        let mut p = ParsedAddress::unparsed("a");
        p.district = Some("包河区".to_string());
        let conflicts = ConflictChecker::check_record(&r, &p);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, "CLAIM_DISTRICT_MISMATCH");
    }

    #[test]
    fn both_conflicts_can_fire_at_once() {
        let r = rec("a", Some("蜀山区"), Some("瑶海区"));
        let mut p = ParsedAddress::unparsed("a");
        p.district = Some("包河区".to_string());
        let conflicts = ConflictChecker::check_record(&r, &p);
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn missing_fields_do_not_conflict() {
        let r = rec("a", None, None);
        let p = ParsedAddress::unparsed("a");
        assert!(ConflictChecker::check_record(&r, &p).is_empty());
    }

    #[test]
    fn pairwise_conflict_checks_claim_before_parsed() {
        let r1 = rec("a", None, Some("蜀山区"));
        let r2 = rec("b", None, Some("瑶海区"));
        let p1 = ParsedAddress::unparsed("a");
        let p2 = ParsedAddress::unparsed("b");
        let reason = ConflictChecker::pair_conflict(&r1, &p1, &r2, &p2);
        assert!(reason.unwrap().contains("district_claim"));
    }

    #[test]
    fn pairwise_conflict_absent_when_all_agree() {
        let r1 = rec("a", Some("蜀山区"), Some("蜀山区"));
        let r2 = rec("b", Some("蜀山区"), Some("蜀山区"));
        let mut p1 = ParsedAddress::unparsed("a");
        p1.district = Some("蜀山区".to_string());
        let mut p2 = ParsedAddress::unparsed("b");
        p2.district = Some("蜀山区".to_string());
        assert!(ConflictChecker::pair_conflict(&r1, &p1, &r2, &p2).is_none());
    }
}
