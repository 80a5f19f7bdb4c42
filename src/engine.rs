//! Top-level search handle: the `Tree` capability and its local (and,
//! per spec.md §9, remote-dispatch-ready) implementations.
//!
//! Grounded on `examples/original_source/jageocoder/local_tree.py`
//! (`LocalTree`, `searchNode`, `installed_dictionary_version`/`_readme`)
//! and spec.md §9's tagged-variant local/remote dispatch design. The
//! teacher's own `src/trie.rs` models a facade over lower-level
//! internals the same way `Tree` sits over `NodeStore`/`AddressTrie`.

use crate::aza::AzaMaster;
use crate::base::NodeId;
use crate::config::SearchConfig;
use crate::destandardize::recover_matched_substring;
use crate::error::{Error, Result};
use crate::node::NodeStore;
use crate::normalize::standardize;
use crate::result::{SearchOutcome, SearchResult};
use crate::trie::AddressTrie;
use crate::walker::search_by_trie;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the environment variable that overrides the default
/// dictionary directory (checked before the OS-default path).
pub const DB_DIR_ENV: &str = "JAGEOCODER_DB_DIR";

/// Capability surface every tree handle (local or remote) exposes.
///
/// Spec.md §9's tagged-variant dispatch (`Tree::Local`/`Tree::Remote`)
/// is realized as a trait here so a `Box<dyn Tree>` or a `Tree` enum can
/// hold either a [`LocalTree`] or a future remote JSON-RPC client
/// without callers caring which.
pub trait TreeHandle {
    /// Runs a search and returns ranked, de-standardized results.
    fn search_node(&mut self, query: &str) -> Result<SearchOutcome>;

    /// Replaces the handle's search configuration, rejecting a
    /// `target_area` entry that names no known pref/city.
    fn set_search_config(&mut self, config: SearchConfig) -> Result<()>;

    /// Returns the handle's current search configuration.
    fn get_search_config(&self) -> &SearchConfig;

    /// Installed dictionary version string.
    fn installed_dictionary_version(&self) -> String;

    /// Installed dictionary README contents, if any.
    fn installed_dictionary_readme(&self) -> String;
}

/// A fully in-process search handle over a [`NodeStore`] and
/// [`AddressTrie`] loaded from disk or built in memory.
pub struct LocalTree {
    nodes: NodeStore,
    trie: AddressTrie,
    aza_master: AzaMaster,
    config: SearchConfig,
    db_dir: Option<PathBuf>,
}

impl LocalTree {
    /// Builds a handle directly from in-memory components (used by
    /// tests and by `jageocoder-build`'s fixture loader).
    pub fn new(nodes: NodeStore, trie: AddressTrie, aza_master: AzaMaster) -> Self {
        LocalTree {
            nodes,
            trie,
            aza_master,
            config: SearchConfig::default(),
            db_dir: None,
        }
    }

    /// Opens a dictionary previously written by the builder at `db_dir`.
    ///
    /// Expects `node_store.bin` and `trie.bin` under `db_dir`;
    /// `aza_master.bin` is optional (a tree built without Cho-Aza
    /// enrichment simply has an empty [`AzaMaster`]).
    pub fn open(db_dir: &Path) -> Result<Self> {
        let node_path = db_dir.join("node_store.bin");
        let trie_path = db_dir.join("trie.bin");
        if !node_path.exists() {
            return Err(Error::DictionaryMissing {
                path: db_dir.display().to_string(),
                file: "node_store.bin".to_string(),
            });
        }
        if !trie_path.exists() {
            return Err(Error::DictionaryMissing {
                path: db_dir.display().to_string(),
                file: "trie.bin".to_string(),
            });
        }

        let nodes = NodeStore::load(&node_path)?;
        let trie = AddressTrie::load(&trie_path)?;
        let aza_path = db_dir.join("aza_master.json");
        let aza_master = if aza_path.exists() {
            let content = std::fs::read_to_string(&aza_path)?;
            serde_json::from_str::<AzaMaster>(&content)
                .map(AzaMaster::reindex)
                .map_err(|e| Error::InternalInconsistency(e.to_string()))?
        } else {
            AzaMaster::default()
        };

        Ok(LocalTree {
            nodes,
            trie,
            aza_master,
            config: SearchConfig::default(),
            db_dir: Some(db_dir.to_path_buf()),
        })
    }

    /// Read-only access to the node store, for callers that need direct
    /// node lookups outside of `search_node` (e.g. `jageocoder-dump`).
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Read-only access to the Cho-Aza master table.
    pub fn aza_master(&self) -> &AzaMaster {
        &self.aza_master
    }

    /// Looks up a node directly by its machiaza id (the 12/13-digit Aza
    /// code), ported from spec.md §4.8's supplemented accessor family.
    pub fn search_by_machiaza_id(&self, code: &str) -> Option<&crate::node::AddressNode> {
        let record = self.aza_master.search_by_code(code)?;
        let key = &record.names_index;
        let ids = self.trie.lookup(key)?;
        ids.first().and_then(|&id| self.nodes.get(id))
    }

    /// Looks up the CITY node whose 6-digit local-authority code matches
    /// `citycode`.
    pub fn search_by_citycode(&self, citycode: &str) -> Option<&crate::node::AddressNode> {
        (0..self.nodes.len() as NodeId)
            .filter_map(|id| self.nodes.get(id))
            .find(|n| self.nodes.city_local_authority_code(n).as_deref() == Some(citycode))
    }

    /// Looks up the PREF node whose name or 2-digit JIS code matches
    /// `prefcode`.
    pub fn search_by_prefcode(&self, prefcode: &str) -> Option<&crate::node::AddressNode> {
        (0..self.nodes.len() as NodeId)
            .filter_map(|id| self.nodes.get(id))
            .find(|n| {
                n.level == crate::base::AddressLevel::Pref
                    && (n.name == prefcode || n.note_field("jiscode") == Some(prefcode))
            })
    }

    /// Looks up nodes carrying `postcode` in their note field (`postcode:`).
    pub fn search_by_postcode(&self, postcode: &str) -> Vec<&crate::node::AddressNode> {
        (0..self.nodes.len() as NodeId)
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| n.note_field("postcode") == Some(postcode))
            .collect()
    }

    /// Resolves the default dictionary directory, per spec.md's
    /// supplemented `get_db_dir` section: checks `JAGEOCODER_DB_DIR`
    /// first, then `$HOME/.local/share/jageocoder/db`.
    ///
    /// The original's additional `sys.prefix`/`site.USER_BASE` fallbacks
    /// are Python-packaging-specific and have no Rust analogue (DESIGN.md
    /// Open Question 4), so they are not translated.
    pub fn default_db_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DB_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let home = std::env::var("HOME")
            .map_err(|_| Error::BadConfig("HOME is not set and JAGEOCODER_DB_DIR is unset".to_string()))?;
        Ok(PathBuf::from(home).join(".local/share/jageocoder/db"))
    }

    /// Collects the set of valid `target_area` entries: every PREF and
    /// CITY node's name plus its JIS/local-authority code.
    fn known_areas(&self) -> HashSet<String> {
        let mut known = HashSet::new();
        for id in 0..self.nodes.len() as NodeId {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            match node.level {
                crate::base::AddressLevel::Pref => {
                    known.insert(node.name.clone());
                    if let Some(code) = node.note_field("jiscode") {
                        known.insert(code.to_string());
                    }
                }
                crate::base::AddressLevel::City => {
                    known.insert(node.name.clone());
                    if let Some(code) = self.nodes.city_local_authority_code(node) {
                        known.insert(code);
                    }
                }
                _ => {}
            }
        }
        known
    }

    /// Follows a node's `ref:` redirect note, if `auto_redirect` is on
    /// and the note is present, returning the node it points to.
    fn redirect(&self, node: &crate::node::AddressNode) -> Option<&crate::node::AddressNode> {
        if !self.config.auto_redirect {
            return None;
        }
        let target_id: NodeId = node.redirect_ref()?.parse().ok()?;
        self.nodes.get(target_id)
    }
}

impl TreeHandle for LocalTree {
    fn search_node(&mut self, query: &str) -> Result<SearchOutcome> {
        debug!("search_node: query='{query}'");
        let mut processed: HashSet<NodeId> = HashSet::new();
        let hits = search_by_trie(&self.nodes, &self.trie, query, &mut processed, &self.config);

        let mut by_node: Vec<(NodeId, String, Option<(f64, f64)>)> = hits
            .into_values()
            .map(|r| (r.node_id, r.matched_index, r.coordinates))
            .collect();
        by_node.sort_by_key(|(_, matched, _)| std::cmp::Reverse(matched.chars().count()));

        let mut matched_cache: HashMap<String, String> = HashMap::new();
        let mut results = Vec::new();
        let mut priorities = Vec::new();

        for (node_id, matched_index, backfilled_coordinates) in by_node {
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            let resolved = self.redirect(node).unwrap_or(node);
            // A redirect points at a different, presumably complete node;
            // its own coordinates win over the original match's backfill.
            let coordinates = if std::ptr::eq(resolved, node) {
                backfilled_coordinates
            } else {
                resolved.coordinates
            };

            let original_matched = if let Some(cached) = matched_cache.get(&matched_index) {
                cached.clone()
            } else {
                let recovered = recover_matched_substring(query, &node.name, &matched_index)?;
                matched_cache.insert(matched_index.clone(), recovered.clone());
                recovered
            };

            results.push(SearchResult {
                id: resolved.id,
                fullname: self.nodes.fullname(resolved),
                coordinates,
                level: resolved.level,
                matched: original_matched,
                note: resolved.note.clone(),
            });
            priorities.push(resolved.priority);
        }

        SearchOutcome::rank(&mut results, &priorities);

        let matched_total: usize = results
            .iter()
            .map(|r| r.matched.chars().count())
            .max()
            .unwrap_or(0);
        let query_chars: Vec<char> = query.chars().collect();
        let unmatched = if matched_total < query_chars.len() {
            query_chars[matched_total..].iter().collect()
        } else {
            String::new()
        };

        Ok(SearchOutcome { results, unmatched })
    }

    fn set_search_config(&mut self, config: SearchConfig) -> Result<()> {
        config.validate(&self.known_areas())?;
        self.config = config;
        Ok(())
    }

    fn get_search_config(&self) -> &SearchConfig {
        &self.config
    }

    fn installed_dictionary_version(&self) -> String {
        let Some(db_dir) = &self.db_dir else {
            return "(in-memory)".to_string();
        };
        let metadata_path = db_dir.join("metadata.txt");
        if let Ok(content) = std::fs::read_to_string(&metadata_path) {
            if let Some(line) = content.lines().next() {
                return line.trim_end().to_string();
            }
        }
        let readme_path = db_dir.join("README.md");
        if let Ok(meta) = std::fs::metadata(&readme_path) {
            if let Ok(modified) = meta.modified() {
                if let Ok(since_epoch) = modified.duration_since(std::time::UNIX_EPOCH) {
                    return format_date_from_unix_days(since_epoch.as_secs() / 86400);
                }
            }
        }
        "(Unknown)".to_string()
    }

    fn installed_dictionary_readme(&self) -> String {
        let Some(db_dir) = &self.db_dir else {
            return "(no README information)".to_string();
        };
        std::fs::read_to_string(db_dir.join("README.md"))
            .unwrap_or_else(|_| "(no README information)".to_string())
    }
}

/// Formats a day count since the Unix epoch as `YYYYMMDD`, avoiding a
/// `chrono`/`time` dependency for this one cosmetic fallback.
fn format_date_from_unix_days(days: u64) -> String {
    let mut y = 1970i64;
    let mut remaining = days as i64;
    loop {
        let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
        let year_len = if leap { 366 } else { 365 };
        if remaining < year_len {
            break;
        }
        remaining -= year_len;
        y += 1;
    }
    let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
    let month_lens: [i64; 12] = [
        31,
        if leap { 29 } else { 28 },
        31, 30, 31, 30, 31, 31, 30, 31, 30, 31,
    ];
    let mut m = 0usize;
    for (i, &len) in month_lens.iter().enumerate() {
        if remaining < len {
            m = i;
            break;
        }
        remaining -= len;
    }
    format!("{:04}{:02}{:02}", y, m + 1, remaining + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{AddressLevel, INVALID_NODE_ID};
    use crate::node::AddressNode;

    fn tiny_tree() -> LocalTree {
        let nodes = NodeStore::from_nodes(vec![
            AddressNode {
                id: 0,
                name: "東京都".to_string(),
                name_index: "東京都".to_string(),
                coordinates: None,
                level: AddressLevel::Pref,
                priority: 0,
                note: String::new(),
                parent_id: INVALID_NODE_ID,
                sibling_id: 2,
            },
            AddressNode {
                id: 1,
                name: "多摩市".to_string(),
                name_index: "多摩市".to_string(),
                coordinates: Some((139.4, 35.6)),
                level: AddressLevel::City,
                priority: 0,
                note: "jiscode:13224".to_string(),
                parent_id: 0,
                sibling_id: 2,
            },
        ])
        .unwrap();

        let trie = AddressTrie::build([
            (standardize("東京都", false), 0u32),
            (standardize("東京都多摩市", false), 1u32),
        ]);

        LocalTree::new(nodes, trie, AzaMaster::default())
    }

    #[test]
    fn test_search_node_finds_longest_match() {
        let mut tree = tiny_tree();
        tree.set_search_config(SearchConfig {
            require_coordinates: false,
            ..SearchConfig::default()
        })
        .unwrap();
        let outcome = tree.search_node("東京都多摩市").unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].fullname, vec!["東京都", "多摩市"]);
    }

    #[test]
    fn test_search_by_citycode() {
        let tree = tiny_tree();
        let node = tree.search_by_citycode(&tree.nodes.city_local_authority_code(tree.nodes.get(1).unwrap()).unwrap());
        assert_eq!(node.map(|n| n.id), Some(1));
    }

    #[test]
    fn test_set_search_config_rejects_unknown_target_area() {
        let mut tree = tiny_tree();
        let result = tree.set_search_config(SearchConfig {
            target_area: vec!["北海道".to_string()],
            ..SearchConfig::default()
        });
        assert!(matches!(result, Err(crate::error::Error::BadConfig(_))));
    }

    #[test]
    fn test_set_search_config_accepts_known_target_area() {
        let mut tree = tiny_tree();
        let result = tree.set_search_config(SearchConfig {
            target_area: vec!["東京都".to_string()],
            ..SearchConfig::default()
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_installed_dictionary_version_in_memory() {
        let tree = tiny_tree();
        assert_eq!(tree.installed_dictionary_version(), "(in-memory)");
    }
}
