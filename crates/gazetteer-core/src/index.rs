//! Five inverted indexes — district, canonicalized AOI, building,
//! canonicalized road, and geo-bucket — over all records in a run, used to
//! draw the candidate set for a query during one-pass scanning.

use std::collections::{HashMap, HashSet};

use crate::model::{AddressRecord, ParsedAddress};
use crate::text::{key_norm, offset_lat_lon};

/// Inverted-index candidate recall plus geo-bucket neighborhood expansion.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    precision: usize,
    district: HashMap<String, Vec<String>>,
    aoi: HashMap<String, Vec<String>>,
    building: HashMap<String, Vec<String>>,
    road: HashMap<String, Vec<String>>,
    geo: HashMap<String, Vec<String>>,
}

impl CandidateIndex {
    pub fn new(precision: usize) -> Self {
        CandidateIndex {
            precision,
            ..Default::default()
        }
    }

    /// The geo-bucket key for a coordinate: `round(lat, p) + "_" + round(lon, p)`.
    pub fn geo_bucket(&self, lat: f64, lon: f64) -> String {
        format!(
            "{:.*}_{:.*}",
            self.precision, lat, self.precision, lon
        )
    }

    /// The geo-bucket an anchor point (optionally offset by a direction and
    /// distance) falls into.
    pub fn relative_anchor_bucket(
        &self,
        anchor_lat: f64,
        anchor_lon: f64,
        direction: Option<&str>,
        dist_m: Option<i64>,
    ) -> String {
        let (lat, lon) = match (direction, dist_m) {
            (Some(d), Some(m)) => offset_lat_lon(anchor_lat, anchor_lon, d, m as f64),
            _ => (anchor_lat, anchor_lon),
        };
        self.geo_bucket(lat, lon)
    }

    /// Add one record's fields to all five indexes it has keys for.
    pub fn index_record(&mut self, rec: &AddressRecord, parsed: &ParsedAddress) {
        if let Some(d) = &parsed.district {
            self.district.entry(d.clone()).or_default().push(rec.rid.clone());
        }
        if let Some(a) = &parsed.aoi {
            self.aoi.entry(key_norm(a)).or_default().push(rec.rid.clone());
        }
        if let Some(b) = &parsed.building {
            self.building.entry(b.to_uppercase()).or_default().push(rec.rid.clone());
        }
        if let Some(r) = &parsed.road {
            self.road.entry(key_norm(r)).or_default().push(rec.rid.clone());
        }
        if let (Some(lat), Some(lon)) = (rec.lat, rec.lon) {
            self.geo.entry(self.geo_bucket(lat, lon)).or_default().push(rec.rid.clone());
        }
    }

    /// The 3x3 neighborhood of geo-bucket keys around `bucket` (itself
    /// included), stepped by `10^-precision` in each axis.
    fn neighborhood(&self, bucket: &str) -> Vec<String> {
        let Some((lat0, lon0)) = parse_bucket(bucket) else {
            return vec![bucket.to_string()];
        };
        let step = 10f64.powi(-(self.precision as i32));
        let offsets = [-step, 0.0, step];
        let mut out = Vec::with_capacity(9);
        for dlat in offsets {
            for dlon in offsets {
                out.push(self.geo_bucket(lat0 + dlat, lon0 + dlon));
            }
        }
        out
    }

    /// Whether `other_bucket` falls within the 3x3 neighborhood of `anchor_bucket`.
    pub fn neighborhood_contains(&self, anchor_bucket: &str, other_bucket: &str) -> bool {
        self.neighborhood(anchor_bucket).iter().any(|b| b == other_bucket)
    }

    /// The candidate rids for a query `(rec, parsed)`, restricted to the
    /// `seen` set (already-processed records) and truncated to
    /// `max_candidates`. Tie-breaking is lexicographic by rid so that the
    /// result is deterministic regardless of index insertion order.
    pub fn candidates_for(
        &self,
        rec: &AddressRecord,
        parsed: &ParsedAddress,
        seen: &HashSet<String>,
        anchor_bucket: Option<&str>,
        max_candidates: usize,
    ) -> Vec<String> {
        let mut set: HashSet<String> = HashSet::new();

        if let Some(d) = &parsed.district {
            if let Some(v) = self.district.get(d) {
                set.extend(v.iter().cloned());
            }
        }
        if let Some(a) = &parsed.aoi {
            if let Some(v) = self.aoi.get(&key_norm(a)) {
                set.extend(v.iter().cloned());
            }
        }
        if let Some(b) = &parsed.building {
            if let Some(v) = self.building.get(&b.to_uppercase()) {
                set.extend(v.iter().cloned());
            }
        }
        if let Some(r) = &parsed.road {
            if let Some(v) = self.road.get(&key_norm(r)) {
                set.extend(v.iter().cloned());
            }
        }
        if let (Some(lat), Some(lon)) = (rec.lat, rec.lon) {
            let center = self.geo_bucket(lat, lon);
            for bucket in self.neighborhood(&center) {
                if let Some(v) = self.geo.get(&bucket) {
                    set.extend(v.iter().cloned());
                }
            }
        }
        if let Some(ab) = anchor_bucket {
            for bucket in self.neighborhood(ab) {
                if let Some(v) = self.geo.get(&bucket) {
                    set.extend(v.iter().cloned());
                }
            }
        }

        set.remove(&rec.rid);
        let mut out: Vec<String> = set.into_iter().filter(|rid| seen.contains(rid)).collect();
        out.sort();
        out.truncate(max_candidates);
        out
    }
}

fn parse_bucket(bucket: &str) -> Option<(f64, f64)> {
    let (lat_s, lon_s) = bucket.split_once('_')?;
    Some((lat_s.parse().ok()?, lon_s.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(rid: &str, lat: Option<f64>, lon: Option<f64>) -> AddressRecord {
        AddressRecord {
            rid: rid.to_string(),
            source: "test".to_string(),
            raw_address: String::new(),
            district_claim: None,
            grid_district: None,
            lat,
            lon,
            extra: Default::default(),
        }
    }

    #[test]
    fn geo_bucket_is_stable_and_neighborhood_has_nine_members_including_center() {
        let index = CandidateIndex::new(4);
        let bucket = index.geo_bucket(31.8204, 117.1292);
        assert_eq!(bucket, "31.8204_117.1292");
        assert_eq!(index.geo_bucket(31.8204, 117.1292), bucket);

        let neighborhood = index.neighborhood(&bucket);
        assert_eq!(neighborhood.len(), 9);
        assert!(neighborhood.contains(&bucket));
    }

    #[test]
    fn candidates_exclude_self_and_unseen_records() {
        let mut index = CandidateIndex::new(4);
        let a = rec("a", None, None);
        let mut pa = ParsedAddress::unparsed("a");
        pa.district = Some("蜀山区".to_string());
        index.index_record(&a, &pa);

        let b = rec("b", None, None);
        let mut pb = ParsedAddress::unparsed("b");
        pb.district = Some("蜀山区".to_string());
        index.index_record(&b, &pb);

        let mut seen = HashSet::new();
        seen.insert("a".to_string());
        // b not yet seen
        let cands = index.candidates_for(&b, &pb, &seen, None, 10);
        assert_eq!(cands, vec!["a".to_string()]);

        let cands_for_a_query = index.candidates_for(&a, &pa, &seen, None, 10);
        assert!(cands_for_a_query.is_empty(), "a is not in the seen set yet relative to itself, and seen only contains a which is excluded as self");
    }

    #[test]
    fn candidates_truncate_to_max_and_are_sorted() {
        let mut index = CandidateIndex::new(4);
        let mut seen = HashSet::new();
        for rid in ["c1", "c2", "c3"] {
            let r = rec(rid, None, None);
            let mut p = ParsedAddress::unparsed(rid);
            p.district = Some("包河区".to_string());
            index.index_record(&r, &p);
            seen.insert(rid.to_string());
        }
        let query = rec("q", None, None);
        let mut pq = ParsedAddress::unparsed("q");
        pq.district = Some("包河区".to_string());

        let cands = index.candidates_for(&query, &pq, &seen, None, 2);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn geo_neighborhood_recalls_adjacent_bucket() {
        let mut index = CandidateIndex::new(2);
        let a = rec("near", Some(31.82), Some(117.13));
        let pa = ParsedAddress::unparsed("near");
        index.index_record(&a, &pa);

        let mut seen = HashSet::new();
        seen.insert("near".to_string());

        // one step away at precision 2 (0.01 deg step)
        let query = rec("q", Some(31.81), Some(117.12));
        let pq = ParsedAddress::unparsed("q");
        let cands = index.candidates_for(&query, &pq, &seen, None, 10);
        assert_eq!(cands, vec!["near".to_string()]);
    }

    #[test]
    fn anchor_bucket_neighborhood_pulls_in_candidates() {
        let mut index = CandidateIndex::new(4);
        let a = rec("anchor_hit", Some(31.8207), Some(117.1289));
        let pa = ParsedAddress::unparsed("anchor_hit");
        index.index_record(&a, &pa);

        let mut seen = HashSet::new();
        seen.insert("anchor_hit".to_string());

        let query = rec("q", None, None);
        let pq = ParsedAddress::unparsed("q");
        let anchor_bucket = "31.8207_117.1289".to_string();
        let cands = index.candidates_for(&query, &pq, &seen, Some(&anchor_bucket), 10);
        assert_eq!(cands, vec!["anchor_hit".to_string()]);
    }
}
