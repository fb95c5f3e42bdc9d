//! Package layout policy and reserved metadata paths.
//!
//! All storage-layout conventions live here: the reserved metadata directory,
//! the checksum-manifest and signature file names, and the namespaced-root
//! variant used by registry tarballs whose entries sit under a single
//! `package/` directory.

use anyhow::Result;
use pkgsig_schema::Address;

use crate::store::PackageStore;

/// Reserved metadata directory. Its subtree is never digested.
pub const META_DIR: &str = "_META_";

/// File name of the checksum manifest inside [`META_DIR`].
pub const CHECKSUMS_FILE: &str = "_checksums.json";

/// File-name prefix of per-signer signature envelopes inside [`META_DIR`].
pub const SIGNATURE_PREFIX: &str = "_sig_";

/// Root-relative descriptor whose presence marks a namespaced-root package.
pub const ROOT_DESCRIPTOR: &str = "package/package.json";

/// Path prefix carried by every entry of a namespaced-root package.
pub const NAMESPACE_PREFIX: &str = "package/";

/// Storage layout variant of a package archive.
///
/// An explicit policy value, decided once per package and passed into path
/// construction, instead of a string probe scattered across components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageLayout {
    /// Entries sit directly at the archive root.
    #[default]
    Flat,
    /// Entries live under a single `package/` root directory.
    NamespacedRoot,
}

impl PackageLayout {
    /// Detect the layout of `store` by probing for [`ROOT_DESCRIPTOR`].
    ///
    /// # Errors
    ///
    /// Propagates store I/O failures.
    pub async fn detect(store: &dyn PackageStore) -> Result<Self> {
        Ok(match store.entry(ROOT_DESCRIPTOR).await? {
            Some(_) => PackageLayout::NamespacedRoot,
            None => PackageLayout::Flat,
        })
    }

    /// Path prefix entries of this layout carry.
    pub fn prefix(self) -> &'static str {
        match self {
            PackageLayout::Flat => "",
            PackageLayout::NamespacedRoot => NAMESPACE_PREFIX,
        }
    }

    /// Storage path of the checksum manifest.
    pub fn checksums_path(self) -> String {
        format!("{}{META_DIR}/{CHECKSUMS_FILE}", self.prefix())
    }

    /// Storage path of the signature envelope for `signer`.
    ///
    /// The address is already normalized by construction, so the same signer
    /// always maps to the same file name.
    pub fn signature_path(self, signer: &Address) -> String {
        format!("{}{META_DIR}/{SIGNATURE_PREFIX}{signer}.json", self.prefix())
    }

    /// True when `relative_path` follows the signature-envelope naming
    /// convention under this layout.
    pub fn is_signature_path(self, relative_path: &str) -> bool {
        relative_path
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix(META_DIR))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|name| name.starts_with(SIGNATURE_PREFIX))
    }
}
