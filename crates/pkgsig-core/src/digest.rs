//! Per-file content digest computation.

use anyhow::Result;
use pkgsig_schema::{DigestAlgorithm, DigestSet, HexDigest};
use sha2::{Digest, Sha256, Sha512};

use crate::layout::META_DIR;
use crate::store::PackageStore;

/// Hex digest of `data` under `algorithm`.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> HexDigest {
    match algorithm {
        DigestAlgorithm::Sha512 => HexDigest::from_raw(&Sha512::digest(data)),
        DigestAlgorithm::Sha256 => HexDigest::from_raw(&Sha256::digest(data)),
    }
}

/// True when `relative_path` has a segment inside the reserved metadata
/// directory.
fn in_metadata_dir(relative_path: &str) -> bool {
    relative_path.split('/').any(|segment| segment == META_DIR)
}

/// Compute one digest per content file of the package.
///
/// Directory entries and everything under the reserved metadata directory are
/// skipped. The result is deterministic for a fixed package state: same
/// paths, same hex digests, canonical key order by construction.
///
/// # Errors
///
/// Propagates store I/O failures; an unreadable entry aborts the whole
/// computation.
pub async fn calculate_digests(
    store: &dyn PackageStore,
    algorithm: DigestAlgorithm,
) -> Result<DigestSet> {
    let mut digests = DigestSet::new();
    for entry in store.entries().await? {
        if entry.is_dir || in_metadata_dir(&entry.relative_path) {
            continue;
        }
        let content = entry.read_content().await?;
        digests.insert(
            algorithm,
            entry.relative_path,
            digest_bytes(algorithm, &content),
        );
    }
    tracing::debug!(
        algorithm = %algorithm,
        files = digests.algorithm(algorithm.as_str()).map_or(0, std::collections::BTreeMap::len),
        "computed package digests"
    );
    Ok(digests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPackage;

    fn sample_package() -> MemoryPackage {
        MemoryPackage::new()
            .with_file("a.txt", "hello")
            .with_file("sub/b.txt", "world")
            .with_dir("sub")
            .with_file("_META_/_checksums.json", "{}")
            .with_file("package/_META_/_sig_0xabc.json", "{}")
    }

    #[tokio::test]
    async fn skips_directories_and_metadata() {
        let digests = calculate_digests(&sample_package(), DigestAlgorithm::Sha512)
            .await
            .unwrap();

        let files = digests.algorithm("sha512").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("a.txt"));
        assert!(files.contains_key("sub/b.txt"));
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let pkg = sample_package();
        let first = calculate_digests(&pkg, DigestAlgorithm::Sha512)
            .await
            .unwrap();
        let second = calculate_digests(&pkg, DigestAlgorithm::Sha512)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn sha256_known_vector() {
        let pkg = MemoryPackage::new().with_file("abc.txt", "abc");
        let digests = calculate_digests(&pkg, DigestAlgorithm::Sha256)
            .await
            .unwrap();

        assert_eq!(
            digests.algorithm("sha256").unwrap()["abc.txt"].as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_matches_direct_hash() {
        let direct = HexDigest::from_raw(&Sha512::digest(b"payload"));
        assert_eq!(digest_bytes(DigestAlgorithm::Sha512, b"payload"), direct);
    }
}
