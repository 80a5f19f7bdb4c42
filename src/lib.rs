//! # jageocoder
//!
//! A Japanese postal address geocoder: normalizes free-form Japanese
//! address notations, indexes address elements in a TRIE, and walks a
//! hierarchical address tree to find the best matching node(s) for a
//! query string.
//!
//! The crate is organized bottom-up:
//! - [`normalize`] folds itaiji/width variants, numbers, and particles
//!   into a canonical index string.
//! - [`node`] and [`aza`] hold the address data model (the node tree and
//!   the Cho-Aza master table).
//! - [`trie`] indexes standardized names for common-prefix search.
//! - [`walker`] and [`destandardize`] implement the recursive matching
//!   algorithm and recover original-query substrings from it.
//! - [`engine`] ties it together behind the [`engine::TreeHandle`] trait.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod aza;
pub mod base;
pub mod config;
pub mod destandardize;
pub mod engine;
pub mod error;
pub mod node;
pub mod normalize;
pub mod result;
pub mod trie;
pub mod walker;

pub use engine::{LocalTree, TreeHandle};
pub use error::{Error, Result};
