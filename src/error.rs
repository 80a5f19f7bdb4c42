//! Error kinds for the geocoder.
//!
//! Ported in spirit from `examples/Yasu-umi-sudachiclone-rs/src/config.rs`'s
//! `ConfigErr`/`SudachiDictErr` pattern: a flat `thiserror` enum with one
//! variant per failure kind, `#[from]` for the I/O boundary.

use thiserror::Error;

/// Errors that can occur while opening a dictionary or running a query.
#[derive(Error, Debug)]
pub enum Error {
    /// A query was issued before a dictionary handle was opened.
    #[error("geocoder has not been initialized: call Tree::open() first")]
    NotInitialized,

    /// The dictionary path exists but required files are missing.
    #[error("dictionary at '{path}' is missing required file '{file}'")]
    DictionaryMissing {
        /// Dictionary directory that was opened.
        path: String,
        /// Name of the missing file.
        file: String,
    },

    /// A JSON-RPC response carried an `error` field, or could not be parsed.
    #[error("remote protocol error: {0}")]
    RemoteProtocolError(String),

    /// A search was attempted against a handle whose TRIE was never built.
    #[error("TRIE index is not available on this handle")]
    TrieUnavailable,

    /// `target_area` referenced a name or code that does not exist.
    #[error("invalid search config: unknown target area '{0}'")]
    BadConfig(String),

    /// A data-integrity invariant was violated while building an in-memory
    /// index (e.g. a node references a parent id that does not exist).
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Propagated I/O failure (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
