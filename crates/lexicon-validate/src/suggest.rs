//! Edit-distance suggestions.

use serde::{Deserialize, Serialize};

/// Candidates further than this from the invalid value are never suggested.
pub const MAX_DISTANCE: usize = 3;
/// Suggestions returned per invalid value unless the caller asks otherwise.
pub const DEFAULT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub candidate: String,
    pub distance: usize,
}

/// Levenshtein distance (insert/delete/substitute, unit cost), case-sensitive.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    levenshtein_with_max(a, &b, usize::MAX)
}

/// Up to `limit` candidates within `MAX_DISTANCE` of `value`, compared
/// case-insensitively, nearest first. Ties keep candidate order.
pub fn suggest<S: AsRef<str>>(value: &str, candidates: &[S], limit: usize) -> Vec<Suggestion> {
    let needle: Vec<char> = value.to_lowercase().chars().collect();

    let mut ranked: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let distance =
                levenshtein_with_max(&candidate.to_lowercase(), &needle, MAX_DISTANCE);
            (distance <= MAX_DISTANCE).then(|| Suggestion {
                candidate: candidate.to_string(),
                distance,
            })
        })
        .collect();

    // `sort_by_key` is stable, which is what breaks ties by candidate order.
    ranked.sort_by_key(|s| s.distance);
    ranked.truncate(limit);
    ranked
}

/// Two-row DP with an early exit once every cell of a row exceeds `max_dist`
/// (the result is then reported as `max_dist + 1`).
fn levenshtein_with_max(value: &str, needle_chars: &[char], max_dist: usize) -> usize {
    let n = needle_chars.len();
    if n == 0 {
        return value.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != needle_chars[j - 1]);
            let deletion = prev[j] + 1;
            let insertion = curr[j - 1] + 1;
            let substitution = prev[j - 1] + cost;
            let d = deletion.min(insertion).min(substitution);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist.saturating_add(1);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
