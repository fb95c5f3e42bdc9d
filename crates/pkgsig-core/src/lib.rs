//! Tamper-evident signing and verification for package archives.
//!
//! Binds a per-file digest table of a package's contents to a signature
//! recoverable to a public-key identity. Digest computation, digest
//! comparison, envelope path resolution, signing, signer recovery, and the
//! verification orchestrator live here; the wire-format types they exchange
//! live in `pkgsig-schema`. Archive I/O stays behind the [`PackageStore`]
//! trait.

pub mod compare;
pub mod digest;
pub mod layout;
pub mod recover;
pub mod sign;
pub mod store;
pub mod verify;

pub use compare::{IntegrityError, compare_digests};
pub use digest::calculate_digests;
pub use layout::PackageLayout;
pub use recover::{SignerIdentity, recover_signer};
pub use sign::{SignOptions, build_payload, sign_payload};
pub use store::{MemoryPackage, PackageEntry, PackageStore};
pub use verify::{SignatureCheck, Verdict, verify_package};
