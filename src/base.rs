//! Base types and constants shared across the crate.
//!
//! Ported in spirit from the teacher's `src/base.rs`: small,
//! well-documented enums and constants with explicit discriminants,
//! exercised by a `#[cfg(test)]` module in the same file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node id type used throughout the node store, TRIE and walker.
pub type NodeId = u32;

/// Id value meaning "no node" / "no parent" (the root's parent).
pub const INVALID_NODE_ID: NodeId = NodeId::MAX;

/// On-disk sentinel for "no coordinate available", per spec.md's data
/// model. Decoded to `None` at the `AddressNode` boundary; never exposed
/// to callers directly (see DESIGN.md Open Question 3).
pub const NO_COORDINATE_SENTINEL: f64 = 999.9;

/// The eight levels of the Japanese address hierarchy.
///
/// Ported from spec.md §3 and the Glossary: PREF/COUNTY/CITY/WARD/OAZA/
/// AZA/BLOCK/BLD. Numeric values are a public contract (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressLevel {
    /// Prefecture (都道府県).
    Pref = 1,
    /// County (郡), present only for some rural addresses.
    County = 2,
    /// City / ward-bearing municipality (市区町村).
    City = 3,
    /// City ward (政令市の区).
    Ward = 4,
    /// Oaza / machi (大字 / 町).
    Oaza = 5,
    /// Aza / chome (字 / 丁目).
    Aza = 6,
    /// Block (street-address 街区, banchi block).
    Block = 7,
    /// Building / jukyo number (号).
    Bld = 8,
}

impl AddressLevel {
    /// All levels in ascending order.
    pub const ALL: [AddressLevel; 8] = [
        AddressLevel::Pref,
        AddressLevel::County,
        AddressLevel::City,
        AddressLevel::Ward,
        AddressLevel::Oaza,
        AddressLevel::Aza,
        AddressLevel::Block,
        AddressLevel::Bld,
    ];

    /// Builds a level from its numeric (1-8) representation.
    pub fn from_u8(v: u8) -> Option<AddressLevel> {
        match v {
            1 => Some(AddressLevel::Pref),
            2 => Some(AddressLevel::County),
            3 => Some(AddressLevel::City),
            4 => Some(AddressLevel::Ward),
            5 => Some(AddressLevel::Oaza),
            6 => Some(AddressLevel::Aza),
            7 => Some(AddressLevel::Block),
            8 => Some(AddressLevel::Bld),
            _ => None,
        }
    }

    /// Numeric (1-8) representation.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AddressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressLevel::Pref => "PREF",
            AddressLevel::County => "COUNTY",
            AddressLevel::City => "CITY",
            AddressLevel::Ward => "WARD",
            AddressLevel::Oaza => "OAZA",
            AddressLevel::Aza => "AZA",
            AddressLevel::Block => "BLOCK",
            AddressLevel::Bld => "BLD",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        for lvl in AddressLevel::ALL {
            assert_eq!(AddressLevel::from_u8(lvl.as_u8()), Some(lvl));
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(AddressLevel::Pref < AddressLevel::City);
        assert!(AddressLevel::City < AddressLevel::Bld);
    }

    #[test]
    fn test_invalid_level() {
        assert_eq!(AddressLevel::from_u8(0), None);
        assert_eq!(AddressLevel::from_u8(9), None);
    }
}
