//! Field-by-field canonicalization of parsed addresses against the AOI and
//! road alias maps, so that "创新大道"/"创新大街"/"Chuangxin Ave" are all
//! treated as the same road during indexing and scoring.

use crate::alias::AliasMap;
use crate::model::ParsedAddress;

/// Canonicalizes the `aoi` and `road` fields of a [`ParsedAddress`] against
/// their respective alias maps, in place.
pub struct Canonicalizer {
    aoi_aliases: AliasMap,
    road_aliases: AliasMap,
}

impl Canonicalizer {
    pub fn new(aoi_aliases: AliasMap, road_aliases: AliasMap) -> Self {
        Canonicalizer {
            aoi_aliases,
            road_aliases,
        }
    }

    /// Map an AOI name to its canonical form, if present.
    pub fn canonical_aoi(&self, aoi: Option<&str>) -> Option<String> {
        aoi.map(|a| self.aoi_aliases.canonicalize(a).to_string())
    }

    /// Map a road name to its canonical form, if present.
    pub fn canonical_road(&self, road: Option<&str>) -> Option<String> {
        road.map(|r| self.road_aliases.canonicalize(r).to_string())
    }

    /// Rewrite `parsed.aoi` and `parsed.road` to their canonical forms.
    pub fn canonicalize(&self, parsed: &mut ParsedAddress) {
        if let Some(aoi) = self.canonical_aoi(parsed.aoi.as_deref()) {
            parsed.aoi = Some(aoi);
        }
        if let Some(road) = self.canonical_road(parsed.road.as_deref()) {
            parsed.road = Some(road);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AliasFile;

    fn canonicalizer() -> Canonicalizer {
        let mut aoi = AliasFile::new();
        aoi.insert("蜀峰广场".to_string(), vec!["蜀峰广场一期".to_string()]);
        let mut road = AliasFile::new();
        road.insert("创新大道".to_string(), vec!["Chuangxin Ave".to_string()]);
        Canonicalizer::new(AliasMap::from_canonical_map(&aoi), AliasMap::from_canonical_map(&road))
    }

    #[test]
    fn canonicalize_rewrites_aoi_and_road() {
        let c = canonicalizer();
        let mut p = ParsedAddress::unparsed("raw");
        p.aoi = Some("蜀峰广场一期".to_string());
        p.road = Some("Chuangxin Ave".to_string());
        c.canonicalize(&mut p);
        assert_eq!(p.aoi.as_deref(), Some("蜀峰广场"));
        assert_eq!(p.road.as_deref(), Some("创新大道"));
    }

    #[test]
    fn canonicalize_leaves_absent_fields_absent() {
        let c = canonicalizer();
        let mut p = ParsedAddress::unparsed("raw");
        c.canonicalize(&mut p);
        assert!(p.aoi.is_none());
        assert!(p.road.is_none());
    }
}
