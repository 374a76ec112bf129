//! A near-linear disjoint-set over record ids, with path compression and
//! union by rank, used to turn SAME judgments into transitive clusters.

use std::collections::HashMap;

/// Disjoint-set over `String` ids (record rids).
#[derive(Debug, Default)]
pub struct UnionFind {
    parent: HashMap<String, String>,
    rank: HashMap<String, u32>,
}

impl UnionFind {
    /// Build a union-find with one singleton set per id.
    pub fn new<I: IntoIterator<Item = String>>(ids: I) -> Self {
        let mut uf = UnionFind::default();
        for id in ids {
            uf.make_set(id);
        }
        uf
    }

    /// Register `id` as its own singleton set if it is not already known.
    pub fn make_set(&mut self, id: String) {
        self.rank.entry(id.clone()).or_insert(0);
        self.parent.entry(id.clone()).or_insert(id);
    }

    /// Find the root of `id`'s set, compressing the path as it walks up. An
    /// id never seen before is implicitly created as its own singleton root.
    pub fn find(&mut self, id: &str) -> String {
        let parent = match self.parent.get(id) {
            Some(p) => p.clone(),
            None => {
                self.make_set(id.to_string());
                return id.to_string();
            }
        };
        if parent == id {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(id.to_string(), root.clone());
        root
    }

    /// Merge the sets containing `a` and `b`, by rank.
    pub fn union(&mut self, a: &str, b: &str) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let rank_a = *self.rank.get(&ra).unwrap_or(&0);
        let rank_b = *self.rank.get(&rb).unwrap_or(&0);
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra.clone());
            *self.rank.entry(ra).or_insert(0) += 1;
        }
    }

    /// `root -> sorted member list` for every set currently tracked.
    pub fn groups(&mut self) -> HashMap<String, Vec<String>> {
        let ids: Vec<String> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for id in ids {
            let root = self.find(&id);
            groups.entry(root).or_default().push(id);
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_finds_itself() {
        let mut uf = UnionFind::new(["a".to_string(), "b".to_string()]);
        assert_eq!(uf.find("a"), "a");
        assert_eq!(uf.find("b"), "b");
    }

    #[test]
    fn union_makes_find_agree() {
        let mut uf = UnionFind::new(["a".to_string(), "b".to_string()]);
        uf.union("a", "b");
        assert_eq!(uf.find("a"), uf.find("b"));
    }

    #[test]
    fn transitive_union_groups_three_members() {
        let mut uf = UnionFind::new(["a".to_string(), "b".to_string(), "c".to_string()]);
        uf.union("a", "b");
        uf.union("b", "c");
        let groups = uf.groups();
        let group = groups.values().find(|v| v.len() == 3).expect("one group of three");
        assert_eq!(group, &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn disjoint_sets_stay_disjoint() {
        let mut uf = UnionFind::new(["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()]);
        uf.union("a", "b");
        uf.union("c", "d");
        assert_ne!(uf.find("a"), uf.find("c"));
        let groups = uf.groups();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn repeated_union_is_idempotent() {
        let mut uf = UnionFind::new(["a".to_string(), "b".to_string()]);
        uf.union("a", "b");
        uf.union("a", "b");
        uf.union("b", "a");
        assert_eq!(uf.find("a"), uf.find("b"));
    }
}
