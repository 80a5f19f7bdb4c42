//! Public result types returned by a search.
//!
//! Grounded on spec.md §6's Result shape and `examples/original_source
//! /jageocoder/result.py`'s `Result` wrapper; made `serde`-serializable
//! since both local and remote (`RemoteTree`, spec.md §9) handles must
//! produce the same JSON shape for the JSON-RPC wire format.

use crate::base::AddressLevel;
use serde::{Deserialize, Serialize};

/// One matched address, with its full name chain, coordinates, level,
/// and how much of the original query it accounted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Id of the matched node.
    pub id: u32,
    /// Full name chain, PREF down to the matched level.
    pub fullname: Vec<String>,
    /// Coordinates, if the node (or a dummy placeholder) has any.
    pub coordinates: Option<(f64, f64)>,
    /// Address hierarchy level of the matched node.
    pub level: AddressLevel,
    /// Portion of the original query string this result accounts for.
    pub matched: String,
    /// Free-form note field carried from the node record.
    pub note: String,
}

/// Outcome of one `search_node` call: zero or more results, plus
/// whatever of the query string went completely unmatched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Ranked results, longest match first, ties broken by node priority.
    pub results: Vec<SearchResult>,
    /// Suffix of the query that no result accounts for.
    pub unmatched: String,
}

/// One candidate produced while walking the tree, before ranking and
/// de-standardization -- an internal type bridging `src/walker.rs` and
/// the public [`SearchOutcome`].
#[derive(Debug, Clone, PartialEq)]
pub struct WalkResult {
    /// Id of the node this candidate reached.
    pub node_id: u32,
    /// Standardized substring of the query this candidate consumed.
    pub matched_index: String,
}

impl SearchOutcome {
    /// Sorts results by match length (longest first), then by node
    /// priority (smaller wins), per spec.md §4.7's ranking rule.
    ///
    /// Priority must already be attached to each result (callers look it
    /// up from the node store before constructing [`SearchResult`]s);
    /// this only orders an already-built `Vec`.
    pub fn rank(results: &mut [SearchResult], priorities: &[u32]) {
        let mut idx: Vec<usize> = (0..results.len()).collect();
        idx.sort_by_key(|&i| {
            let matched_len = results[i].matched.chars().count() as i64;
            let priority = priorities.get(i).copied().unwrap_or(0) as i64;
            -(matched_len * 100) + priority
        });
        let reordered: Vec<SearchResult> = idx.into_iter().map(|i| results[i].clone()).collect();
        results.clone_from_slice(&reordered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: u32, matched: &str) -> SearchResult {
        SearchResult {
            id,
            fullname: vec!["東京都".to_string()],
            coordinates: None,
            level: AddressLevel::Pref,
            matched: matched.to_string(),
            note: String::new(),
        }
    }

    #[test]
    fn test_rank_prefers_longer_match() {
        let mut results = vec![sample(1, "東京"), sample(2, "東京都多摩市")];
        SearchOutcome::rank(&mut results, &[0, 0]);
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn test_rank_ties_broken_by_priority() {
        let mut results = vec![sample(1, "東京都"), sample(2, "東京都")];
        SearchOutcome::rank(&mut results, &[5, 1]);
        assert_eq!(results[0].id, 2);
    }
}
