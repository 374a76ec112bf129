//! Resolution of a parsed address's relative geographic description (an
//! intersection, or a named AOI, optionally offset by a direction and
//! distance) to a concrete geo-bucket via the repository's anchor table.

use crate::index::CandidateIndex;
use crate::model::ParsedAddress;
use crate::repository::Repository;

/// Resolve the geo-bucket a parsed address's anchor description falls into,
/// in order of precedence: a named street intersection first, then a named
/// AOI, then absent if neither resolves to a known anchor.
///
/// The intersection's two street names are looked up as a single sorted,
/// pipe-joined key (`"文昌路|永乐北路"`), matching the anchor table's
/// `key_text` convention.
pub async fn resolve_anchor_bucket(
    repo: &dyn Repository,
    index: &CandidateIndex,
    parsed: &ParsedAddress,
) -> crate::error::CoreResult<Option<String>> {
    if let Some((a, b)) = &parsed.intersection {
        if !a.is_empty() && !b.is_empty() {
            let mut names = [a.as_str(), b.as_str()];
            names.sort_unstable();
            let key = names.join("|");
            if let Some(anchor) = repo.find_anchor_by_key(&key).await? {
                return Ok(Some(index.relative_anchor_bucket(
                    anchor.lat,
                    anchor.lon,
                    parsed.direction.as_deref(),
                    parsed.distance_m,
                )));
            }
        }
    }

    if let Some(aoi) = &parsed.aoi {
        if let Some(anchor) = repo.find_anchor_by_key(aoi).await? {
            return Ok(Some(index.relative_anchor_bucket(
                anchor.lat,
                anchor.lon,
                parsed.direction.as_deref(),
                parsed.distance_m,
            )));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CandidateIndex;
    use crate::model::{AddressRecord, Anchor};
    use crate::repository::tests::InMemoryRepository;

    #[tokio::test]
    async fn intersection_anchor_takes_precedence_over_aoi() {
        let repo = InMemoryRepository::default();
        repo.anchors.lock().unwrap().insert(
            "文昌路|永乐北路".to_string(),
            Anchor {
                anchor_id: "a2".to_string(),
                anchor_type: Some("intersection".to_string()),
                key_text: "文昌路|永乐北路".to_string(),
                district: Some("蜀山区".to_string()),
                lat: 31.8115,
                lon: 117.1330,
            },
        );
        let index = CandidateIndex::new(4);

        let mut p = ParsedAddress::unparsed("raw");
        p.intersection = Some(("永乐北路".to_string(), "文昌路".to_string()));
        p.aoi = Some("高新创新园".to_string());

        let bucket = resolve_anchor_bucket(&repo, &index, &p).await.unwrap();
        assert!(bucket.is_some());
    }

    #[tokio::test]
    async fn absent_anchor_falls_through_to_none() {
        let repo = InMemoryRepository::default();
        let index = CandidateIndex::new(4);
        let p = ParsedAddress::unparsed("raw");
        let bucket = resolve_anchor_bucket(&repo, &index, &p).await.unwrap();
        assert!(bucket.is_none());
        let _ = AddressRecord::ad_hoc("x", "y");
    }
}
