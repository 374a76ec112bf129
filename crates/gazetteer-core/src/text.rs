//! Text normalization, fuzzy-matching, and geometry helpers shared by the
//! candidate index and the pair scorer.

use std::collections::HashSet;

/// Earth radius in meters, used by [`haversine_m`].
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Strip full-width brackets, drop parenthesized asides, collapse whitespace,
/// and fold full-width digits to half-width, returning a lowercased string.
pub fn normalize_text(text: &str) -> String {
    let replaced = text
        .trim()
        .replace('（', "(")
        .replace('）', ")")
        .replace('【', "[")
        .replace('】', "]");

    let without_parens = strip_bracketed(&replaced, '(', ')');
    let without_brackets = strip_bracketed(&without_parens, '[', ']');

    let collapsed = collapse_whitespace(&without_brackets);
    let ascii_digits = fullwidth_digits_to_ascii(&collapsed);

    ascii_digits.to_lowercase().trim().to_string()
}

fn strip_bracketed(s: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0u32;
    for c in s.chars() {
        if c == open {
            depth += 1;
            continue;
        }
        if c == close {
            if depth > 0 {
                depth -= 1;
            }
            continue;
        }
        if depth == 0 {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn fullwidth_digits_to_ascii(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF10}'..='\u{FF19}' => {
                let offset = c as u32 - '\u{FF10}' as u32;
                char::from_u32('0' as u32 + offset).unwrap_or(c)
            }
            other => other,
        })
        .collect()
}

/// Lowercase a string and strip all whitespace, used as the lookup key for
/// alias maps ("key norm" — not the same normalization as [`normalize_text`]).
pub fn key_norm(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect()
}

/// The set of contiguous `n`-character substrings of `s`, after stripping
/// whitespace. Strings shorter than `n` yield the whole (non-empty) string.
pub fn char_ngram_set(s: &str, n: usize) -> HashSet<String> {
    let stripped: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.len() < n {
        return if stripped.is_empty() {
            HashSet::new()
        } else {
            let mut set = HashSet::new();
            set.insert(stripped.into_iter().collect());
            set
        };
    }
    let mut out = HashSet::new();
    for window in stripped.windows(n) {
        out.insert(window.iter().collect());
    }
    out
}

/// Jaccard similarity of the `n`-gram sets of `a` and `b`; 0.0 if either
/// string is empty or yields an empty n-gram set.
pub fn jaccard_sim(a: &str, b: &str, n: usize) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a = char_ngram_set(a, n);
    let set_b = char_ngram_set(b, n);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count().max(1);
    intersection as f64 / union as f64
}

/// Great-circle distance between two lat/lon points, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dl / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Map a distance in meters to a stepwise geo-proximity score: `<=30m -> 1.0`,
/// `<=80m -> 0.7`, `<=200m -> 0.4`, otherwise `0.0`. `None` (missing
/// coordinates on either side) also scores `0.0`.
pub fn geo_score(dist_m: Option<f64>) -> f64 {
    match dist_m {
        None => 0.0,
        Some(d) if d <= 30.0 => 1.0,
        Some(d) if d <= 80.0 => 0.7,
        Some(d) if d <= 200.0 => 0.4,
        Some(_) => 0.0,
    }
}

/// Map one of the eight Chinese compass directions to a unit-ish Cartesian
/// vector (lat axis, lon axis); unknown/absent directions map to `(0, 0)`.
pub fn direction_to_vector(direction: &str) -> (f64, f64) {
    match direction.trim() {
        "东" => (0.0, 1.0),
        "西" => (0.0, -1.0),
        "南" => (-1.0, 0.0),
        "北" => (1.0, 0.0),
        "东北" => (1.0, 1.0),
        "西北" => (1.0, -1.0),
        "东南" => (-1.0, 1.0),
        "西南" => (-1.0, -1.0),
        _ => (0.0, 0.0),
    }
}

/// Offset a lat/lon point by `dist_m` meters in the given compass direction,
/// using a flat-earth approximation valid for sub-kilometer offsets. Near
/// the poles the longitude-degree shrinkage is floored at `cos(lat) = 0.2`
/// so the offset never blows up.
pub fn offset_lat_lon(lat: f64, lon: f64, direction: &str, dist_m: f64) -> (f64, f64) {
    let (dlat_u, dlon_u) = direction_to_vector(direction);
    let norm = (dlat_u * dlat_u + dlon_u * dlon_u).sqrt();
    let norm = if norm == 0.0 { 1.0 } else { norm };
    let dlat_u = dlat_u / norm;
    let dlon_u = dlon_u / norm;

    let dlat = (dist_m * dlat_u) / 111_000.0;
    let cos_lat = lat.to_radians().cos().max(0.2);
    let dlon = (dist_m * dlon_u) / (111_000.0 * cos_lat);

    (lat + dlat, lon + dlon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalize_drops_parenthesized_asides_and_folds_digits() {
        let out = normalize_text("蜀峰广场（一期） ０１号楼");
        assert_eq!(out, "蜀峰广场 01号楼");
    }

    #[test]
    fn key_norm_strips_case_and_space() {
        assert_eq!(key_norm("Chuangxin Ave"), "chuangxinave");
    }

    #[test]
    fn ngram_set_falls_back_to_whole_string_when_too_short() {
        let set = char_ngram_set("a", 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn jaccard_identical_strings_is_one() {
        assert_abs_diff_eq!(jaccard_sim("创新大道", "创新大道", 2), 1.0);
    }

    #[test]
    fn jaccard_empty_input_is_zero() {
        assert_eq!(jaccard_sim("", "创新大道", 2), 0.0);
    }

    #[test]
    fn geo_score_buckets() {
        assert_abs_diff_eq!(geo_score(Some(10.0)), 1.0);
        assert_abs_diff_eq!(geo_score(Some(50.0)), 0.7);
        assert_abs_diff_eq!(geo_score(Some(150.0)), 0.4);
        assert_abs_diff_eq!(geo_score(Some(500.0)), 0.0);
        assert_abs_diff_eq!(geo_score(None), 0.0);
    }

    #[test]
    fn haversine_zero_distance_for_identical_points() {
        assert_abs_diff_eq!(haversine_m(31.82, 117.13, 31.82, 117.13), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn offset_moves_north_for_north_direction() {
        let (lat2, lon2) = offset_lat_lon(31.82, 117.13, "北", 100.0);
        assert!(lat2 > 31.82);
        assert_abs_diff_eq!(lon2, 117.13, epsilon = 1e-9);
    }

    #[test]
    fn offset_is_no_op_for_unknown_direction() {
        let (lat2, lon2) = offset_lat_lon(31.82, 117.13, "", 100.0);
        assert_abs_diff_eq!(lat2, 31.82);
        assert_abs_diff_eq!(lon2, 117.13);
    }
}
