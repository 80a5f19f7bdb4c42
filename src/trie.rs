//! Address TRIE: common-prefix search and exact lookup over standardized
//! address strings.
//!
//! The teacher's own LOUDS trie (`src/grimoire/trie/louds_trie.rs`) is an
//! unimplemented 23-line stub, and this module's own test suite (before
//! this rewrite) called `Reader`/`Writer` methods that exist nowhere in
//! the teacher snapshot. Per spec.md §4.3 ("any static trie with
//! common-prefix-search and key lookup; a MARISA-style succinct trie is
//! acceptable, not required") this crate replaces the internals with a
//! `BTreeMap`-backed index instead of completing a byte-exact MARISA
//! port -- see DESIGN.md's `src/trie.rs` entry for the full rationale.
//! The public surface (`build`, `common_prefix_search`, `lookup`) keeps
//! the shape of the teacher's own `Trie` API.

use crate::base::NodeId;
use crate::error::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// One hit from [`AddressTrie::common_prefix_search`]: a matched key and
/// the node ids registered under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixMatch<'a> {
    /// The matched key (a prefix of the search string).
    pub key: &'a str,
    /// Node ids registered under this key.
    pub node_ids: &'a [NodeId],
}

/// Static index from standardized address strings to the node ids whose
/// `name_index` equals that string.
///
/// Multiple nodes can share the same standardized key (e.g. two
/// same-named oaza in different cities), so each key maps to a list of
/// ids rather than a single one -- ported from the teacher's own
/// `Key` type allowing duplicate registration under one string.
#[derive(Debug, Clone, Default)]
pub struct AddressTrie {
    entries: BTreeMap<String, Vec<NodeId>>,
}

impl AddressTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        AddressTrie {
            entries: BTreeMap::new(),
        }
    }

    /// Builds a trie from `(key, node_id)` pairs, as produced by the
    /// dictionary builder. Keys are expected to already be standardized
    /// (spec.md §4.3: "the index holds name_index values, never raw
    /// notations").
    pub fn build<I: IntoIterator<Item = (String, NodeId)>>(pairs: I) -> Self {
        let mut entries: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for (key, id) in pairs {
            entries.entry(key).or_default().push(id);
        }
        AddressTrie { entries }
    }

    /// Registers one more `(key, node_id)` pair.
    pub fn insert(&mut self, key: String, id: NodeId) {
        self.entries.entry(key).or_default().push(id);
    }

    /// Number of distinct keys in the trie.
    pub fn num_keys(&self) -> usize {
        self.entries.len()
    }

    /// Exact lookup: node ids registered under `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<&[NodeId]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// All keys that are a prefix of `query`, longest first, each paired
    /// with its node ids.
    ///
    /// Ported from the teacher's `Trie::common_prefix_search`, but
    /// driven by `BTreeMap::range` over the candidate prefix lengths
    /// instead of a LOUDS bit-vector walk: this is the hot path of
    /// `search_by_trie` (walker.rs), called once per byte offset the
    /// walker backs off to, so candidates are generated longest-first to
    /// let callers short-circuit on the first hit when they only need
    /// the best match.
    pub fn common_prefix_search<'a>(&'a self, query: &'a str) -> Vec<PrefixMatch<'a>> {
        let mut hits = Vec::new();
        // char_indices gives us every valid prefix boundary; walk them
        // from longest to shortest.
        let boundaries: Vec<usize> = query
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(query.len()))
            .collect();

        for &end in boundaries.iter().skip(1).rev() {
            let candidate = &query[..end];
            if let Some((key, ids)) = self.entries.get_key_value(candidate) {
                hits.push(PrefixMatch {
                    key,
                    node_ids: ids.as_slice(),
                });
            }
        }
        hits
    }

    /// All keys starting with `prefix` ("predictive search" in the
    /// teacher's terminology), in key order.
    pub fn predictive_search<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [NodeId])> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Serializes the trie as a flat list of `(key, ids)` records.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.entries.len() as u32)?;
        for (key, ids) in &self.entries {
            let bytes = key.as_bytes();
            w.write_u32::<LittleEndian>(bytes.len() as u32)?;
            w.write_all(bytes)?;
            w.write_u32::<LittleEndian>(ids.len() as u32)?;
            for &id in ids {
                w.write_u32::<LittleEndian>(id)?;
            }
        }
        Ok(())
    }

    /// Reads a trie previously written by [`AddressTrie::write`].
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let num_keys = r.read_u32::<LittleEndian>()?;
        let mut entries = BTreeMap::new();
        for _ in 0..num_keys {
            let key_len = r.read_u32::<LittleEndian>()?;
            let mut key_buf = vec![0u8; key_len as usize];
            r.read_exact(&mut key_buf)?;
            let key = String::from_utf8(key_buf)
                .map_err(|e| crate::error::Error::InternalInconsistency(e.to_string()))?;
            let num_ids = r.read_u32::<LittleEndian>()?;
            let mut ids = Vec::with_capacity(num_ids as usize);
            for _ in 0..num_ids {
                ids.push(r.read_u32::<LittleEndian>()?);
            }
            entries.insert(key, ids);
        }
        Ok(AddressTrie { entries })
    }

    /// Writes the trie to `path`.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let mut f = std::fs::File::create(path)?;
        self.write(&mut f)
    }

    /// Reads a trie from `path`.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let mut f = std::fs::File::open(path)?;
        AddressTrie::read(&mut f)
    }
}
