//! Digest algorithm tags, validated hex digests, and the algorithm-tagged
//! path-to-digest table.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Content-digest algorithms supported by the signing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-512, the scheme's default for package content digests.
    #[default]
    Sha512,
    /// SHA-256, kept for callers that need the shorter digest.
    Sha256,
}

impl DigestAlgorithm {
    /// Wire name of the algorithm, used as the digest-table key.
    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur when validating a hex digest string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The digest string is empty.
    #[error("digest is empty")]
    Empty,

    /// The digest string has an odd number of characters.
    #[error("digest has odd length {0}")]
    OddLength(usize),

    /// The digest string contains non-hex characters.
    #[error("digest contains non-hex characters: '{0}'")]
    NonHex(String),
}

/// A validated lowercase hex content digest.
///
/// Length is algorithm-dependent (128 chars for SHA-512, 64 for SHA-256), so
/// validation only enforces well-formed hex. Validation happens at
/// deserialization time, preventing malformed digest strings from propagating
/// into comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexDigest(String);

impl HexDigest {
    /// Create a validated `HexDigest`, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// Returns a [`DigestError`] if `s` is empty, has odd length, or contains
    /// non-hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        if s.is_empty() {
            return Err(DigestError::Empty);
        }
        if s.len() % 2 != 0 {
            return Err(DigestError::OddLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s));
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Hex-encode raw digest bytes.
    pub fn from_raw(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Return the lowercase hex form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for HexDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for HexDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for HexDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Algorithm-tagged table of relative file path to content digest.
///
/// Both levels are `BTreeMap`s, so any serialization of a `DigestSet` is
/// canonical (lexicographic key order) regardless of insertion order. The
/// serialized form feeds the signing input, which is why order must never
/// depend on how the table was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestSet {
    algorithms: BTreeMap<String, BTreeMap<String, HexDigest>>,
}

impl DigestSet {
    /// Create an empty digest set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the digest of `relative_path` under `algorithm`.
    pub fn insert(
        &mut self,
        algorithm: DigestAlgorithm,
        relative_path: impl Into<String>,
        digest: HexDigest,
    ) {
        self.algorithms
            .entry(algorithm.as_str().to_string())
            .or_default()
            .insert(relative_path.into(), digest);
    }

    /// The path-to-digest table for `algorithm`, if present.
    pub fn algorithm(&self, algorithm: &str) -> Option<&BTreeMap<String, HexDigest>> {
        self.algorithms.get(algorithm)
    }

    /// Iterate over the algorithm names present in this set.
    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// True when no algorithm table has been recorded.
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
