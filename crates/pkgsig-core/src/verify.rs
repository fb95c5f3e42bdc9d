//! Verification orchestration: one verdict per stored signature envelope.
//!
//! Integrity comparison and signer recovery run independently and never
//! short-circuit each other: a broken signature does not suppress the
//! integrity check, and tampered content does not suppress recovery. All
//! per-envelope failures stay inside that envelope's report; only store I/O
//! aborts the operation.

use anyhow::Result;
use pkgsig_schema::{
    Address, CertificatePayload, DigestAlgorithm, DigestSet, FormatError, SignatureEnvelope,
};
use serde::Serialize;

use crate::compare::{IntegrityError, compare_digests};
use crate::digest::calculate_digests;
use crate::layout::PackageLayout;
use crate::recover::{SignerIdentity, recover_signer};
use crate::store::{PackageEntry, PackageStore};

/// Outcome of the digest comparison for one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityOutcome {
    /// Claimed and computed digests agree on every path.
    Valid,
    /// The comparison failed; the offending paths are attached.
    Invalid(IntegrityError),
}

impl IntegrityOutcome {
    /// True when the comparison succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, IntegrityOutcome::Valid)
    }
}

/// Combined verification verdict for one signature envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// Recovered signer identity, or the unrecoverable sentinel.
    pub signer: SignerIdentity,
    /// Result of the claimed-vs-computed digest comparison.
    pub integrity: IntegrityOutcome,
    /// Certificates attached to the envelope. Always empty; reserved for a
    /// future extension.
    pub certificates: Vec<CertificatePayload>,
}

impl Verdict {
    /// True when the package contents match the signed checksums.
    pub fn is_valid(&self) -> bool {
        self.integrity.is_valid()
    }
}

/// Verification report for one stored signature file.
#[derive(Debug)]
pub struct SignatureCheck {
    /// Relative path of the signature file inside the package.
    pub path: String,
    /// The verdict, or the parse failure for this one file.
    pub verdict: Result<Verdict, FormatError>,
}

/// Verify one parsed envelope against freshly computed digests.
///
/// Integrity and recovery are evaluated independently; each failure is
/// folded into its own field of the verdict.
pub fn verify_envelope(
    envelope: &SignatureEnvelope,
    computed: &DigestSet,
    algorithm: DigestAlgorithm,
) -> Verdict {
    let integrity = match compare_digests(&envelope.payload.data, computed, algorithm) {
        Ok(()) => IntegrityOutcome::Valid,
        Err(error) => {
            tracing::warn!(%error, "integrity check failed");
            IntegrityOutcome::Invalid(error)
        }
    };

    let signer = recover_signer(envelope);

    Verdict {
        signer,
        integrity,
        certificates: Vec::new(),
    }
}

/// Locate stored signature entries for the package.
///
/// With a `signer` address, resolves that signer's exact envelope path; an
/// absent file yields an empty list, not an error. Without one, returns
/// every entry matching the signature naming convention.
///
/// # Errors
///
/// Propagates store I/O failures.
pub async fn signature_entries(
    store: &dyn PackageStore,
    layout: PackageLayout,
    signer: Option<&Address>,
) -> Result<Vec<PackageEntry>> {
    if let Some(address) = signer {
        let path = layout.signature_path(address);
        return Ok(store.entry(&path).await?.into_iter().collect());
    }

    Ok(store
        .entries()
        .await?
        .into_iter()
        .filter(|entry| !entry.is_dir && layout.is_signature_path(&entry.relative_path))
        .collect())
}

/// Verify every signature envelope found in the package (or the one for
/// `signer`), producing one report per signature file.
///
/// A malformed signature file is reported as that file's parse failure and
/// never prevents verdicts for the other files.
///
/// # Errors
///
/// Propagates store I/O failures (unreadable entries); these abort the whole
/// operation.
pub async fn verify_package(
    store: &dyn PackageStore,
    signer: Option<&Address>,
    algorithm: DigestAlgorithm,
) -> Result<Vec<SignatureCheck>> {
    let layout = PackageLayout::detect(store).await?;
    let computed = calculate_digests(store, algorithm).await?;
    let entries = signature_entries(store, layout, signer).await?;

    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = entry.read_content().await?;
        let verdict = SignatureEnvelope::parse(&raw)
            .map(|envelope| verify_envelope(&envelope, &computed, algorithm));
        reports.push(SignatureCheck {
            path: entry.relative_path,
            verdict,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPackage;

    fn signer() -> Address {
        Address::parse("0xf863ac227b0a0bca88cb2ff45d91632626ce32e7").unwrap()
    }

    #[tokio::test]
    async fn entries_for_absent_signer_are_empty() {
        let pkg = MemoryPackage::new().with_file("a.txt", "hello");
        let found = signature_entries(&pkg, PackageLayout::Flat, Some(&signer()))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn entries_scan_matches_convention_only() {
        let pkg = MemoryPackage::new()
            .with_file("a.txt", "hello")
            .with_file("_META_/_checksums.json", "{}")
            .with_file("_META_/_sig_0xaaa.json", "{}")
            .with_file("_META_/_sig_0xbbb.json", "{}");

        let found = signature_entries(&pkg, PackageLayout::Flat, None)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(
            found
                .iter()
                .all(|e| e.relative_path.starts_with("_META_/_sig_"))
        );
    }

    #[tokio::test]
    async fn malformed_file_reported_per_file() {
        let pkg = MemoryPackage::new()
            .with_file("a.txt", "hello")
            .with_file("_META_/_sig_0xaaa.json", "not json at all");

        let reports = verify_package(&pkg, None, DigestAlgorithm::Sha512)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].verdict.is_err());
    }
}
