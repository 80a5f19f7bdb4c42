//! Search configuration, threaded explicitly through the call stack.
//!
//! Grounded on the teacher's `src/grimoire/trie/config.rs` (a plain
//! struct with a `Default` impl) and
//! `examples/original_source/jageocoder/local_tree.py::validate_config`.

use crate::error::{Error, Result};

/// Search-time configuration. Defaults match spec.md §4.6.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Keep only the longest match (spec default: `true`).
    pub best_only: bool,
    /// NONAME-oaza fallback policy: `Some(true)`/`Some(false)` forces
    /// always/never descending into the NONAME placeholder; `None` (the
    /// default) leaves it to the walker's own per-candidate heuristic.
    pub aza_skip: Option<bool>,
    /// Drop nodes without valid coordinates (spec default: `true`).
    pub require_coordinates: bool,
    /// Restrict results to these pref/city codes or names (spec default: empty).
    pub target_area: Vec<String>,
    /// Follow `ref:` notes to a redirected address after a match (spec default: `true`).
    pub auto_redirect: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            best_only: true,
            aza_skip: None,
            require_coordinates: true,
            target_area: Vec::new(),
            auto_redirect: true,
        }
    }
}

impl SearchConfig {
    /// Creates a config with spec.md §4.6 defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `target_area` against the set of known pref/city
    /// codes and names, returning `Error::BadConfig` for the first
    /// entry that matches neither.
    ///
    /// `known` is the set of valid codes/names a tree handle can supply
    /// (prefecture and city `name`/`name_index`/JIS codes); callers
    /// assemble it once per dictionary and reuse it across validations.
    pub fn validate(&self, known: &std::collections::HashSet<String>) -> Result<()> {
        for area in &self.target_area {
            if !known.contains(area) {
                return Err(Error::BadConfig(area.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let cfg = SearchConfig::default();
        assert!(cfg.best_only);
        assert_eq!(cfg.aza_skip, None);
        assert!(cfg.require_coordinates);
        assert!(cfg.target_area.is_empty());
        assert!(cfg.auto_redirect);
    }

    #[test]
    fn test_validate_unknown_target_area() {
        let mut cfg = SearchConfig::new();
        cfg.target_area.push("東京都".to_string());
        let known: std::collections::HashSet<String> = ["北海道".to_string()].into_iter().collect();
        assert!(matches!(cfg.validate(&known), Err(Error::BadConfig(_))));
    }

    #[test]
    fn test_validate_known_target_area() {
        let mut cfg = SearchConfig::new();
        cfg.target_area.push("東京都".to_string());
        let known: std::collections::HashSet<String> = ["東京都".to_string()].into_iter().collect();
        assert!(cfg.validate(&known).is_ok());
    }
}
