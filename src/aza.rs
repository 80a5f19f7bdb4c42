//! Cho-Aza master table: canonical names and codes for oaza/aza/chome
//! elements, independent of the node tree.
//!
//! Ported from `examples/original_source/jageocoder/aza_master.py`'s
//! `AzaMaster`. The original is a SQLAlchemy ORM row; this crate has no
//! database layer (spec.md's Non-goals exclude a SQL backend), so it is
//! represented as a plain record plus a `BTreeMap` lookup table, stored
//! with `serde_json` the way the teacher's own CLI tools print
//! structures for inspection (`src/bin/rsmarisa-dump.rs`).

use crate::base::AddressLevel;
use crate::normalize::{check_optional_prefixes, standardize};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One address element as carried in an [`AzaRecord`]: level, display
/// name, kana reading, and the code prefix it introduces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzaElement {
    /// Hierarchy level this element occupies.
    pub level: AddressLevel,
    /// Display text, e.g. "多摩市".
    pub name: String,
    /// Kana reading, e.g. "タマシ".
    pub kana: String,
}

/// A single Cho-Aza master row: the full chain of address elements for
/// one aza code, plus a handful of per-row flags carried through from
/// the address-base registry CSV.
///
/// Fields the original SQLAlchemy model declares but the CSV loader
/// leaves commented out (`pref_kana`, `county_eng`, and so on) are not
/// reproduced here -- they would only ever be `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzaRecord {
    /// 5-digit local-authority code plus 7-digit machiaza id.
    pub code: String,
    /// Full chain of address elements, PREF down to AZA/chome.
    pub names: Vec<AzaElement>,
    /// Standardized lookup key built from `names` by [`AzaRecord::standardize_aza_name`].
    pub names_index: String,
    /// 町字区分コード: 1 = oaza/machi, 2 = chome, 3 = koaza.
    pub aza_class: Option<u8>,
    /// Whether this aza uses jukyo-hyoji (residential display) numbering.
    pub is_jukyo: bool,
    /// 起番フラグ: 1 = numbered from 1, 2 = not numbered, 0 = not registered.
    pub start_count_type: Option<u8>,
    /// Postal codes associated with this aza, semicolon-joined in the source CSV.
    pub postcode: Vec<String>,
}

impl AzaRecord {
    /// Standardizes a chain of `(level, name)` pairs into the lookup key
    /// stored in `names_index`.
    ///
    /// Ported from `aza_master.py::AzaMaster.standardize_aza_name`: each
    /// element is normalized, its optional prefix (`字`/`大字`/`小字`) is
    /// stripped, and -- unlike ordinary node `name_index` values -- any
    /// ケ/ヶ/ガ/ツ/ッ/ノ/字/大字/小字 token inside the *body* (excluding the
    /// first and last character) is deleted outright rather than merely
    /// elided by adjacency, so that e.g. "二ノ宮" and "二宮" collapse to
    /// the same key even when [`standardize`]'s adjacency guard would
    /// have kept the ノ.
    pub fn standardize_aza_name(elements: &[(AddressLevel, &str)]) -> String {
        lazy_static::lazy_static! {
            static ref RE_OPTIONAL: Regex = Regex::new(
                "ケ|ヶ|ガ|ツ|ッ|ノ|字|大字|小字"
            ).unwrap();
        }

        let mut converted = String::new();
        for (_level, raw_name) in elements {
            let name = standardize(raw_name, false);
            let prefix_len = check_optional_prefixes(&name);
            let chars: Vec<char> = name.chars().skip(prefix_len).collect();

            let (head, body, tail): (String, String, String) = if chars.len() > 1 {
                (
                    chars[0].to_string(),
                    chars[1..chars.len() - 1].iter().collect(),
                    chars[chars.len() - 1].to_string(),
                )
            } else {
                (chars.first().map(|c| c.to_string()).unwrap_or_default(), String::new(), String::new())
            };

            let body = RE_OPTIONAL.replace_all(&body, "").into_owned();
            converted.push_str(&head);
            converted.push_str(&body);
            converted.push_str(&tail);
        }
        converted
    }
}

/// In-memory lookup index over [`AzaRecord`]s, keyed both by their
/// standardized name chain and by their machiaza code.
///
/// Grounded on `aza_master.py`'s two query class-methods
/// (`search_by_names`, `search_by_code`); the SQL `WHERE` clauses become
/// plain `BTreeMap` lookups since this crate has no database layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzaMaster {
    records: Vec<AzaRecord>,
    #[serde(skip)]
    by_names_index: BTreeMap<String, usize>,
    #[serde(skip)]
    by_code: BTreeMap<String, usize>,
}

impl AzaMaster {
    /// Builds an index over `records`, keying each by its `names_index`
    /// and `code`.
    pub fn new(records: Vec<AzaRecord>) -> Self {
        let mut by_names_index = BTreeMap::new();
        let mut by_code = BTreeMap::new();
        for (i, r) in records.iter().enumerate() {
            by_names_index.entry(r.names_index.clone()).or_insert(i);
            by_code.entry(r.code.clone()).or_insert(i);
        }
        AzaMaster {
            records,
            by_names_index,
            by_code,
        }
    }

    /// Rebuilds the lookup maps after deserializing `records` alone
    /// (the maps are not serialized, see the `#[serde(skip)]` fields).
    pub fn reindex(mut self) -> Self {
        self.by_names_index.clear();
        self.by_code.clear();
        for (i, r) in self.records.iter().enumerate() {
            self.by_names_index.entry(r.names_index.clone()).or_insert(i);
            self.by_code.entry(r.code.clone()).or_insert(i);
        }
        self
    }

    /// Number of records in the master table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the master table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by its address-element chain.
    ///
    /// Ported from `aza_master.py::AzaMaster.search_by_names`.
    pub fn search_by_names(&self, elements: &[(AddressLevel, &str)]) -> Option<&AzaRecord> {
        let key = AzaRecord::standardize_aza_name(elements);
        self.by_names_index.get(&key).map(|&i| &self.records[i])
    }

    /// Looks up a record by its machiaza code.
    ///
    /// A 13-digit code is `lasdec(6) + aza_id(7)`; the lasdec check
    /// digit is dropped so the lookup matches the stored 5+7-digit
    /// `code` field, per `aza_master.py::AzaMaster.search_by_code`.
    pub fn search_by_code(&self, code: &str) -> Option<&AzaRecord> {
        let normalized = if code.chars().count() == 13 {
            let chars: Vec<char> = code.chars().collect();
            let mut s: String = chars[0..5].iter().collect();
            s.extend(&chars[6..]);
            s
        } else {
            code.to_string()
        };
        self.by_code.get(&normalized).map(|&i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AzaRecord {
        AzaRecord {
            code: "132240012345".to_string(),
            names: vec![
                AzaElement {
                    level: AddressLevel::Pref,
                    name: "東京都".to_string(),
                    kana: "トウキョウト".to_string(),
                },
                AzaElement {
                    level: AddressLevel::City,
                    name: "多摩市".to_string(),
                    kana: "タマシ".to_string(),
                },
            ],
            names_index: AzaRecord::standardize_aza_name(&[
                (AddressLevel::Pref, "東京都"),
                (AddressLevel::City, "多摩市"),
            ]),
            aza_class: Some(1),
            is_jukyo: false,
            start_count_type: Some(1),
            postcode: vec!["206-0011".to_string()],
        }
    }

    #[test]
    fn test_standardize_aza_name_strips_elidable_tokens_in_body() {
        // ノ inside the body is deleted outright, unlike ordinary standardize();
        // 二 is itself a kansuji digit, so it canonicalizes to "2." first.
        let key = AzaRecord::standardize_aza_name(&[(AddressLevel::Oaza, "二ノ宮")]);
        assert_eq!(key, "2.宮");
    }

    #[test]
    fn test_standardize_aza_name_strips_optional_body_tokens() {
        // ケ between two kanji heads/tails is deleted from the body outright.
        let key = AzaRecord::standardize_aza_name(&[(AddressLevel::Oaza, "龍ケ崎")]);
        assert_eq!(key, "龍崎");
    }

    #[test]
    fn test_search_by_names_roundtrip() {
        let master = AzaMaster::new(vec![sample_record()]);
        let found = master
            .search_by_names(&[(AddressLevel::Pref, "東京都"), (AddressLevel::City, "多摩市")])
            .expect("record should be found");
        assert_eq!(found.code, sample_record().code);
    }

    #[test]
    fn test_search_by_code_13_digit_strips_lasdec_check_digit() {
        let mut record = sample_record();
        record.code = "132240012345".to_string();
        let master = AzaMaster::new(vec![record]);
        // 13-digit: 6-digit lasdec "132240" + check-stripped via [0:5]+[6:].
        let found = master.search_by_code("1322406012345").expect("should find by 13-digit code");
        assert_eq!(found.code, "132240012345");
    }

    #[test]
    fn test_search_by_code_not_found() {
        let master = AzaMaster::new(vec![sample_record()]);
        assert!(master.search_by_code("999999999999").is_none());
    }
}
