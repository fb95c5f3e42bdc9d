//! Claimed-vs-computed digest comparison.

use pkgsig_schema::{DigestAlgorithm, DigestSet};
use serde::Serialize;
use thiserror::Error;

/// Reasons an integrity check can fail, with the offending paths attached.
///
/// An explicit result value, not an unwound exception: the orchestrator folds
/// it into the verdict and tests assert on the exact paths it names.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityError {
    /// One side has no digest table for the comparison algorithm.
    #[error("no {algorithm} digest table present")]
    AlgorithmMissing {
        /// Wire name of the algorithm that was expected.
        algorithm: String,
    },

    /// The claimed and computed path sets differ. Every path present on only
    /// one side is listed.
    #[error("package contents and checksums name different files: {} missing, {} unexpected", missing.len(), unexpected.len())]
    PathSetMismatch {
        /// Paths the checksums claim but the package no longer contains.
        missing: Vec<String>,
        /// Paths the package contains but the checksums never claimed.
        unexpected: Vec<String>,
    },

    /// A file's digest differs from the claimed value.
    #[error("integrity violation at file: {path}")]
    DigestMismatch {
        /// The first path whose digest did not match.
        path: String,
    },
}

/// Check that `claimed` and `computed` agree under `algorithm`.
///
/// Path sets are compared first; if they differ, the full symmetric
/// difference is reported. Only then are digest values compared per path.
/// Success requires set equality and value equality for every path; there is
/// no partial-match notion.
///
/// # Errors
///
/// Returns an [`IntegrityError`] naming the offending path(s).
pub fn compare_digests(
    claimed: &DigestSet,
    computed: &DigestSet,
    algorithm: DigestAlgorithm,
) -> Result<(), IntegrityError> {
    let missing_table = || IntegrityError::AlgorithmMissing {
        algorithm: algorithm.as_str().to_string(),
    };
    let claimed = claimed
        .algorithm(algorithm.as_str())
        .ok_or_else(missing_table)?;
    let computed = computed
        .algorithm(algorithm.as_str())
        .ok_or_else(missing_table)?;

    let missing: Vec<String> = claimed
        .keys()
        .filter(|path| !computed.contains_key(*path))
        .cloned()
        .collect();
    let unexpected: Vec<String> = computed
        .keys()
        .filter(|path| !claimed.contains_key(*path))
        .cloned()
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(IntegrityError::PathSetMismatch {
            missing,
            unexpected,
        });
    }

    for (path, digest) in computed {
        if claimed.get(path) != Some(digest) {
            return Err(IntegrityError::DigestMismatch { path: path.clone() });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgsig_schema::HexDigest;

    fn set(entries: &[(&str, &str)]) -> DigestSet {
        let mut digests = DigestSet::new();
        for (path, hex) in entries {
            digests.insert(
                DigestAlgorithm::Sha512,
                *path,
                HexDigest::new(*hex).unwrap(),
            );
        }
        digests
    }

    #[test]
    fn identical_sets_match() {
        let claimed = set(&[("a.txt", "aa"), ("b.txt", "bb")]);
        let computed = set(&[("a.txt", "aa"), ("b.txt", "bb")]);
        assert!(compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).is_ok());
    }

    #[test]
    fn value_mismatch_names_the_path() {
        let claimed = set(&[("a.txt", "aa"), ("b.txt", "bb")]);
        let computed = set(&[("a.txt", "aa"), ("b.txt", "ff")]);

        let err = compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::DigestMismatch {
                path: "b.txt".to_string()
            }
        );
    }

    #[test]
    fn removed_file_is_reported_missing() {
        let claimed = set(&[("a.txt", "aa"), ("b.txt", "bb")]);
        let computed = set(&[("a.txt", "aa")]);

        let err = compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::PathSetMismatch {
                missing: vec!["b.txt".to_string()],
                unexpected: vec![],
            }
        );
    }

    #[test]
    fn added_file_is_reported_unexpected() {
        let claimed = set(&[("a.txt", "aa")]);
        let computed = set(&[("a.txt", "aa"), ("extra.bin", "ee")]);

        let err = compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::PathSetMismatch {
                missing: vec![],
                unexpected: vec!["extra.bin".to_string()],
            }
        );
    }

    #[test]
    fn same_size_different_sets_still_fail() {
        let claimed = set(&[("a.txt", "aa")]);
        let computed = set(&[("z.txt", "aa")]);

        let err = compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::PathSetMismatch {
                missing: vec!["a.txt".to_string()],
                unexpected: vec!["z.txt".to_string()],
            }
        );
    }

    #[test]
    fn missing_algorithm_table_fails() {
        let claimed = set(&[("a.txt", "aa")]);
        let computed = DigestSet::new();

        let err = compare_digests(&claimed, &computed, DigestAlgorithm::Sha512).unwrap_err();
        assert!(matches!(err, IntegrityError::AlgorithmMissing { .. }));
    }
}
