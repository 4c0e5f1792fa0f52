//! Pack range expansion: "1-3,5,7-9" to the set {1,2,3,5,7,8,9}.
//!
//! Malformed tokens (non-numeric, or a range with start > end) are dropped
//! silently; the expansion only fails when nothing valid remains.

use std::collections::BTreeSet;

use crate::error::XdmError;

/// Expands a comma-separated pack expression into a deduplicated set.
///
/// Each token is either a single non-negative integer or an inclusive
/// `start-end` range. Whitespace around tokens and around the range dash is
/// ignored. Returns `XdmError::Validation` when the expanded set is empty.
/// No upper bound on magnitude or count is enforced here; that is caller
/// policy.
pub fn expand_pack_ranges(expr: &str) -> Result<BTreeSet<u32>, XdmError> {
    let mut packs = BTreeSet::new();

    for token in expr.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse::<u32>();
                let end = end.trim().parse::<u32>();
                match (start, end) {
                    (Ok(start), Ok(end)) if start <= end => {
                        packs.extend(start..=end);
                    }
                    _ => {
                        tracing::debug!(token, "dropping malformed pack range token");
                    }
                }
            }
            None => match token.parse::<u32>() {
                Ok(pack) => {
                    packs.insert(pack);
                }
                Err(_) => {
                    tracing::debug!(token, "dropping non-numeric pack token");
                }
            },
        }
    }

    if packs.is_empty() {
        return Err(XdmError::validation(format!(
            "no valid pack numbers in expression {expr:?}"
        )));
    }
    Ok(packs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(packs: &[u32]) -> BTreeSet<u32> {
        packs.iter().copied().collect()
    }

    #[test]
    fn expands_ranges_and_singles() {
        let packs = expand_pack_ranges("1-3,5,7-9").unwrap();
        assert_eq!(packs, set(&[1, 2, 3, 5, 7, 8, 9]));
    }

    #[test]
    fn drops_malformed_tokens_silently() {
        let packs = expand_pack_ranges("2-1,abc,4").unwrap();
        assert_eq!(packs, set(&[4]));
    }

    #[test]
    fn fails_when_nothing_valid_remains() {
        let err = expand_pack_ranges("abc").unwrap_err();
        assert!(matches!(err, XdmError::Validation(_)));
    }

    #[test]
    fn tolerates_whitespace_everywhere() {
        let packs = expand_pack_ranges(" 1 - 3 , 5 ,, 8 ").unwrap();
        assert_eq!(packs, set(&[1, 2, 3, 5, 8]));
    }

    #[test]
    fn deduplicates_overlapping_ranges() {
        let packs = expand_pack_ranges("1-4,3-6,4").unwrap();
        assert_eq!(packs, set(&[1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn iteration_is_ascending() {
        let packs = expand_pack_ranges("9,1,5").unwrap();
        let ordered: Vec<u32> = packs.iter().copied().collect();
        assert_eq!(ordered, vec![1, 5, 9]);
    }

    #[test]
    fn empty_expression_is_validation_error() {
        assert!(expand_pack_ranges("").is_err());
        assert!(expand_pack_ranges(" , ,").is_err());
    }
}
