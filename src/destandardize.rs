//! De-standardization: recovering the original-query substring that a
//! standardized match corresponds to.
//!
//! The walker (`src/walker.rs`) only ever sees standardized text, so its
//! matched-length numbers describe positions in *that* string, not in
//! the raw query the caller typed. Ported from
//! `examples/original_source/jageocoder/local_tree.py
//! ::_get_matched_substring` (the version with the cycle guard; the
//! same method in `tree.py` lacks it).

use crate::error::{Error, Result};
use crate::normalize::standardize;

/// Recovers the prefix of `query` (the original, unstandardized search
/// string) whose `keep_numbers = true` standardization has the same
/// character length as `matched` (the standardized substring the walker
/// consumed while reaching `node_name`).
///
/// Probes candidate split positions by binary-search-like stepping
/// (ported verbatim: this is a linear walk, not a binary search, because
/// `standardize`'s output length is not monotonic enough to bisect
/// safely) and detects non-convergence via a visited-position history.
pub fn recover_matched_substring(query: &str, node_name: &str, matched: &str) -> Result<String> {
    let qchars: Vec<char> = query.chars().collect();
    let l_result = matched.chars().count();
    let mut pos: isize = l_result.min(qchars.len()) as isize;
    let mut pos_history = vec![pos];
    let mut recovered = String::new();

    loop {
        let end = pos.max(0) as usize;
        let substr: String = qchars[..end.min(qchars.len())].iter().collect();
        let standardized = standardize(&substr, true);
        let l_standardized = standardized.chars().count();

        if l_standardized == l_result {
            recovered = substr;
            break;
        }

        if l_standardized <= l_result {
            pos += 1;
        } else {
            pos -= 1;
        }

        if pos < 0 || pos > qchars.len() as isize {
            break;
        }

        if pos_history.contains(&pos) {
            return Err(Error::InternalInconsistency(format!(
                "can't de-standardize matched '{matched}' in '{query}'"
            )));
        }
        pos_history.push(pos);
    }

    let pos = pos.max(0) as usize;
    if pos < qchars.len() && !node_name.is_empty() {
        let node_last = node_name.chars().last();
        if Some(qchars[pos]) == node_last {
            let extended: String = qchars[..pos + 1].iter().collect();
            if standardize(&extended, false).chars().count() == l_result {
                // The node's own last letter was elided by normalization
                // (e.g. "上ノ" -> "上") but the query actually spells it
                // out, so the match really extends one character further.
                recovered = extended;
            }
        } else if query.ends_with("通り") || query.ends_with("通リ") {
            recovered = qchars[..pos + 1].iter().collect();
        }
    }

    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_exact_match() {
        let query = "多摩市落合1-15-2";
        let matched = standardize(query, true);
        let recovered = recover_matched_substring(query, "落合", &matched).unwrap();
        assert_eq!(recovered, query);
    }

    #[test]
    fn test_recover_partial_prefix() {
        let matched = standardize("多摩市", true);
        let recovered = recover_matched_substring("多摩市落合", "多摩市", &matched).unwrap();
        assert_eq!(recovered, "多摩市");
    }

    #[test]
    fn test_recover_empty_query() {
        let recovered = recover_matched_substring("", "", "").unwrap();
        assert_eq!(recovered, "");
    }
}
