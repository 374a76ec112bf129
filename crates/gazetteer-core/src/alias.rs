//! Bidirectional alias indexes: map a canonical name to its known aliases,
//! and build the reverse (alias -> canonical) lookup used during
//! canonicalization and candidate recall.

use std::collections::HashMap;
use std::path::Path;

use crate::error::CoreResult;
use crate::model::AliasFile;
use crate::text::key_norm;

/// A reverse alias index: `key_norm(alias or canonical)` -> canonical name.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    reverse: HashMap<String, String>,
}

impl AliasMap {
    /// Build the reverse index from a canonical-to-aliases map. The
    /// canonical name is also indexed under its own key so looking it up
    /// is a no-op.
    pub fn from_canonical_map(canonical_to_aliases: &AliasFile) -> Self {
        let mut reverse = HashMap::new();
        for (canon, aliases) in canonical_to_aliases {
            reverse.insert(key_norm(canon), canon.clone());
            for alias in aliases {
                reverse.insert(key_norm(alias), canon.clone());
            }
        }
        AliasMap { reverse }
    }

    /// Load an alias file from disk and build its reverse index.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: AliasFile = serde_json::from_str(&raw)?;
        Ok(Self::from_canonical_map(&parsed))
    }

    /// Resolve a name to its canonical form, falling back to the input
    /// unchanged if it is not a known alias or canonical name.
    pub fn canonicalize<'a>(&'a self, name: &'a str) -> &'a str {
        self.reverse
            .get(&key_norm(name))
            .map(|s| s.as_str())
            .unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AliasFile {
        let mut m = AliasFile::new();
        m.insert(
            "创新大道".to_string(),
            vec!["创新大街".to_string(), "Chuangxin Ave".to_string()],
        );
        m
    }

    #[test]
    fn alias_resolves_to_canonical() {
        let am = AliasMap::from_canonical_map(&sample());
        assert_eq!(am.canonicalize("Chuangxin Ave"), "创新大道");
        assert_eq!(am.canonicalize("创新大街"), "创新大道");
    }

    #[test]
    fn canonical_name_resolves_to_itself() {
        let am = AliasMap::from_canonical_map(&sample());
        assert_eq!(am.canonicalize("创新大道"), "创新大道");
    }

    #[test]
    fn unknown_name_passes_through_unchanged() {
        let am = AliasMap::from_canonical_map(&sample());
        assert_eq!(am.canonicalize("未知道路"), "未知道路");
    }
}
