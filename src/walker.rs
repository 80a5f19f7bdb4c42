//! The recursive address walker: given a TRIE common-prefix hit, descend
//! the node tree matching as much of the remaining query as possible.
//!
//! Grounded on `examples/original_source/jageocoder/local_tree.py
//! ::search_by_trie` for the top-level loop (best_only/target_area/
//! require_coordinates/aza_skip handling, the `processed_nodes` loop
//! guard, result ranking), cross-checked against
//! `examples/original_source/jageocoder/node.py::search_recursive` for
//! rules (a) exact-prefix, (b) optional-postfix elision, (c) Sapporo
//! 条-elision, and (e) the Kyoto street-name skip, and against
//! `examples/original_source/jageocoder/address.py::search_recursive`
//! for rule (d), the hyphen-as-wildcard rule (present there but not in
//! the `node.py` copy). No single original file carries every rule at
//! once; DESIGN.md records the combined order as authoritative.

use crate::base::{AddressLevel, NodeId};
use crate::config::SearchConfig;
use crate::node::{AddressNode, NodeStore};
use crate::normalize::{check_optional_postfixes, check_optional_prefixes, match_len, standardize};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// One match produced while descending from a node: the node that was
/// reached and the substring of the original query consumed to get
/// there (including whatever optional prefix preceded it).
#[derive(Debug, Clone, PartialEq)]
pub struct WalkCandidate {
    /// Id of the node reached by this candidate path.
    pub node_id: NodeId,
    /// Portion of the standardized index string this candidate consumed.
    pub matched: String,
}

/// Descends from `node` trying to consume as much of `index` as
/// possible, in the rule order a-e. Returns one candidate per leaf
/// reached; backtracks to `node` itself (an empty-match candidate) when
/// none of its children extend the match.
///
/// Ported from `node.py::search_recursive` (rules a, b, c, e) and
/// `address.py::search_recursive` (rule d).
pub fn search_recursive(store: &NodeStore, node: &AddressNode, index: &str) -> Vec<WalkCandidate> {
    let l_optional_prefix = check_optional_prefixes(index);
    let optional_prefix: String = index.chars().take(l_optional_prefix).collect();
    let index: String = index.chars().skip(l_optional_prefix).collect();
    let index = index.as_str();

    if index.is_empty() {
        return vec![WalkCandidate {
            node_id: node.id,
            matched: optional_prefix,
        }];
    }

    let hyphen_pos = index.find('-');
    let hyphen_pattern: Option<Regex> = hyphen_pos.map(|pos| {
        Regex::new(&format!("^{}.*", regex::escape(&index[..pos]))).expect("valid escaped regex")
    });

    let mut candidates = Vec::new();

    for child in store.children(node) {
        // (a) exact prefix: the child's whole standardized name appears
        // literally at the start of what remains of the query.
        if index.starts_with(&child.name_index) {
            let offset = child.name_index.len();
            let rest = &index[offset..];
            for cand in search_recursive(store, child, rest) {
                candidates.push(WalkCandidate {
                    node_id: cand.node_id,
                    matched: format!("{optional_prefix}{}{}", child.name_index, cand.matched),
                });
            }
            continue;
        }

        // (b) optional-postfix elision: drop a trailing 条/線/丁/丁目/
        // 番/番地/号 from the child's name and try again, also
        // swallowing a literal hyphen left dangling at the split point
        // (e.g. index="2.-8." vs. child.name_index="2.番").
        let l_postfix = check_optional_postfixes(&child.name_index);
        if l_postfix > 0 {
            let total_chars = child.name_index.chars().count();
            let alt_child_index: String = child
                .name_index
                .chars()
                .take(total_chars - l_postfix)
                .collect();
            if index.starts_with(&alt_child_index) {
                let mut offset = alt_child_index.len();
                if index[offset..].starts_with('-') {
                    offset += 1;
                }
                let rest = &index[offset..];
                let prefix_consumed = &index[..offset];
                for cand in search_recursive(store, child, rest) {
                    candidates.push(WalkCandidate {
                        node_id: cand.node_id,
                        matched: format!("{optional_prefix}{prefix_consumed}{}", cand.matched),
                    });
                }
                continue;
            }
        }

        // (c) Sapporo-style 条-elision: "北3西1" instead of "北3条西一丁目".
        if child.name_index.contains('条') {
            let alt_name_index = child.name_index.replacen('条', "", 1);
            if index.starts_with(&alt_name_index) {
                let offset = alt_name_index.len();
                let rest = &index[offset..];
                for cand in search_recursive(store, child, rest) {
                    candidates.push(WalkCandidate {
                        node_id: cand.node_id,
                        matched: format!("{optional_prefix}{alt_name_index}{}", cand.matched),
                    });
                }
                continue;
            }
        }

        // (d) hyphen-as-wildcard: a "-" in the query can stand in for an
        // elided block/chome name, so any child whose name_index starts
        // with the text before the hyphen is accepted, consuming
        // through the hyphen itself.
        if let (Some(pos), Some(re)) = (hyphen_pos, &hyphen_pattern) {
            if re.is_match(&child.name_index) {
                let rest = &index[pos + 1..];
                let prefix_consumed = &index[..=pos];
                for cand in search_recursive(store, child, rest) {
                    candidates.push(WalkCandidate {
                        node_id: cand.node_id,
                        matched: format!("{optional_prefix}{prefix_consumed}{}", cand.matched),
                    });
                }
            }
        }
    }

    // (e) Kyoto street-name skip: only at a WARD node whose parent is
    // 京都市, and only tried against candidates that weren't already
    // found by rules a-d (spec.md: "only when no other rule matched").
    if candidates.is_empty()
        && node.level == AddressLevel::Ward
        && store.parent_of(node).map(|p| p.name.as_str()) == Some("京都市")
    {
        for child in store.children(node) {
            if let Some(pos) = index.find(&child.name_index) {
                if pos > 0 {
                    let offset = pos + child.name_index.len();
                    let rest = &index[offset..];
                    let prefix_consumed = &index[..offset];
                    for cand in search_recursive(store, child, rest) {
                        candidates.push(WalkCandidate {
                            node_id: cand.node_id,
                            matched: format!("{optional_prefix}{prefix_consumed}{}", cand.matched),
                        });
                    }
                }
            }
        }
    }

    if candidates.is_empty() {
        candidates.push(WalkCandidate {
            node_id: node.id,
            matched: optional_prefix,
        });
    }

    candidates
}

/// One accepted result from [`search_by_trie`]: the matched node and the
/// portion of the *original* query string (not the standardized index)
/// that was consumed, used by callers such as `search_node` to report
/// the unmatched remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct TrieSearchResult {
    /// Id of the matched node.
    pub node_id: NodeId,
    /// Standardized substring consumed to reach this node.
    pub matched_index: String,
    /// Coordinates to report for this match: the node's own, or a
    /// sibling's backfilled ones when `require_coordinates` let it
    /// through without any of its own (see
    /// [`crate::node::NodeStore::effective_coordinates`]).
    pub coordinates: Option<(f64, f64)>,
}

/// Finds the nodes that match `query` the longest, starting from the
/// TRIE's common-prefix candidates and descending with
/// [`search_recursive`].
///
/// Ported from `local_tree.py::search_by_trie`. `processed_nodes` is
/// mutated in place so repeated calls (as `search_node` makes while
/// consuming multi-address input) never revisit the same node.
pub fn search_by_trie(
    store: &NodeStore,
    trie: &crate::trie::AddressTrie,
    query: &str,
    processed_nodes: &mut HashSet<NodeId>,
    config: &SearchConfig,
) -> BTreeMap<NodeId, TrieSearchResult> {
    let index = standardize(query, true);
    let index_for_trie = standardize(query, false);
    let candidates = trie.common_prefix_search(&index_for_trie);

    let mut results: BTreeMap<NodeId, TrieSearchResult> = BTreeMap::new();
    let mut max_len: usize = 0;
    let mut min_part: Option<usize> = None;
    let mut min_key_len = 0usize;
    let mut resolved_node_ids: HashSet<NodeId> = HashSet::new();

    // Longest-first, matching the teacher's `sorted(keys, key=len, reverse=True)`.
    for pm in candidates {
        let k = pm.key;
        if k.chars().count() < min_key_len {
            continue;
        }

        let offset = match_len(&index, k);
        let key = &index[..offset];
        let rest_index = &index[offset..];

        for &node_id in pm.node_ids {
            let Some(node) = store.get(node_id) else {
                continue;
            };

            if min_key_len == 0 && node.level <= AddressLevel::Ward {
                min_key_len = k.chars().count();
            }

            if processed_nodes.contains(&node_id) {
                continue;
            }

            if !config.target_area.is_empty() && !node_in_target_area(store, node, &config.target_area) {
                continue;
            }

            let mut results_by_node = search_recursive(store, node, rest_index);
            processed_nodes.insert(node_id);

            let no_match_yet = results_by_node.len() == 1
                && results_by_node[0].node_id == node_id
                && results_by_node[0].matched.is_empty();

            if no_match_yet && node.level == AddressLevel::City {
                // aza_skip names the NONAME *fallback being skipped*: Some(true)
                // always skips it (never descend), Some(false) never skips it
                // (always descend), None leaves it to the per-candidate check below.
                let should_try_noname = match config.aza_skip {
                    Some(true) => false,
                    Some(false) => true,
                    None => !results
                        .values()
                        .any(|r| r.matched_index.starts_with(key) && r.matched_index.as_str() > key),
                };

                if should_try_noname {
                    if let Some(noname_id) = node.id.checked_add(1) {
                        if let Some(noname) = store.get(noname_id) {
                            if noname.is_noname() && !processed_nodes.contains(&noname_id) {
                                processed_nodes.insert(noname_id);
                                for cand in search_recursive(store, noname, rest_index) {
                                    if !cand.matched.is_empty() {
                                        results_by_node.push(cand);
                                    }
                                }
                            }
                        }
                    }
                }
            }

            for cand in results_by_node {
                let Some(cand_node) = store.get(cand.node_id) else {
                    continue;
                };

                if !config.target_area.is_empty()
                    && !node_in_target_area(store, cand_node, &config.target_area)
                {
                    continue;
                }

                let coordinates = store.effective_coordinates(cand_node);
                if config.require_coordinates && coordinates.is_none() {
                    continue;
                }

                let key_chars = key.chars().count();
                let total_len = key_chars + cand.matched.chars().count();
                let matched_part = key_chars + cand.matched.chars().count();

                if config.best_only {
                    if total_len > max_len {
                        results.clear();
                        results.insert(
                            cand.node_id,
                            TrieSearchResult {
                                node_id: cand.node_id,
                                matched_index: format!("{key}{}", cand.matched),
                                coordinates,
                            },
                        );
                        max_len = total_len;
                        min_part = Some(matched_part);
                    } else if total_len == max_len
                        && !results.contains_key(&cand.node_id)
                        && min_part.map(|mp| matched_part <= mp).unwrap_or(true)
                    {
                        results.insert(
                            cand.node_id,
                            TrieSearchResult {
                                node_id: cand.node_id,
                                matched_index: format!("{key}{}", cand.matched),
                                coordinates,
                            },
                        );
                        min_part = Some(matched_part);
                    }
                } else {
                    if resolved_node_ids.contains(&cand.node_id) {
                        continue;
                    }
                    let mut cur = store.parent_of(cand_node);
                    while let Some(p) = cur {
                        resolved_node_ids.insert(p.id);
                        cur = store.parent_of(p);
                    }
                    results.insert(
                        cand.node_id,
                        TrieSearchResult {
                            node_id: cand.node_id,
                            matched_index: format!("{key}{}", cand.matched),
                            coordinates,
                        },
                    );
                    max_len = max_len.max(total_len);
                    min_part = Some(min_part.map_or(matched_part, |mp| mp.min(matched_part)));
                }
            }
        }
    }

    results
}

fn node_in_target_area(store: &NodeStore, node: &AddressNode, target_area: &[String]) -> bool {
    let fullname = store.fullname(node);
    let jiscode = store.city_local_authority_code(node);
    target_area.iter().any(|area| {
        fullname.iter().any(|n| n == area)
            || jiscode.as_deref() == Some(area.as_str())
    })
}
