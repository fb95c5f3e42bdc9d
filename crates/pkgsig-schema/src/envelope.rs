//! Detached-payload signature envelope and payload wire types.
//!
//! The payload is transmitted as structured JSON alongside the signature,
//! never base64url-folded into the signing input (the `b64: false` detached
//! convention). The signing input is reconstructed as
//! `protected || '.' || canonical payload JSON`, so the canonical
//! serialization here is a bit-for-bit contract between signer and verifier.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digest::DigestSet;

/// Version tag written into every signature payload.
pub const PAYLOAD_VERSION: u32 = 1;

/// Issuer value for self-signed payloads.
pub const ISSUER_SELF: &str = "self";

/// JWS algorithm tag for recoverable secp256k1 signatures.
pub const ALG_ES256K_R: &str = "ES256K-R";

/// Errors that can occur when decoding stored signature material.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The bytes are not valid JSON or a required field is absent.
    #[error("malformed signature data: {0}")]
    Json(#[from] serde_json::Error),

    /// A base64url-encoded field could not be decoded.
    #[error("malformed base64url field: {0}")]
    Encoding(#[from] base64::DecodeError),
}

/// The unit that gets signed: a version tag, issuer, expiry, and the digest
/// table of the package contents at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePayload {
    /// Payload format version, currently [`PAYLOAD_VERSION`].
    pub version: u32,
    /// Issuer URI, or [`ISSUER_SELF`] for self-signed envelopes.
    pub iss: String,
    /// Expiry as a UNIX timestamp in seconds.
    pub exp: i64,
    /// Digest table of the package's content files.
    pub data: DigestSet,
}

impl SignaturePayload {
    /// Parse a payload (e.g. a stored checksum manifest) from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if the bytes are not valid JSON or a
    /// required field is absent.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The canonical serialization of this payload.
    ///
    /// Compact JSON with struct fields in declaration order and digest-table
    /// keys in lexicographic order. This exact byte form feeds the signing
    /// input and the stored checksum manifest; any divergence between signer
    /// and verifier breaks recovery for every envelope.
    pub fn canonical_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct the exact byte string that gets hashed and signed:
    /// `protected || '.' || canonical payload JSON`.
    pub fn signing_input(&self, protected: &str) -> Result<Vec<u8>, FormatError> {
        Ok(format!("{protected}.{}", self.canonical_json()?).into_bytes())
    }
}

/// The JWS protected header, transported base64url-encoded in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Signature algorithm tag.
    pub alg: String,
    /// Whether the payload is base64url-encoded in the signing input.
    /// Always `false` in this scheme.
    pub b64: bool,
    /// Header parameters that verifiers must understand.
    pub crit: Vec<String>,
}

impl ProtectedHeader {
    /// The header used for recoverable secp256k1 envelopes.
    pub fn es256k_recoverable() -> Self {
        Self {
            alg: ALG_ES256K_R.to_string(),
            b64: false,
            crit: vec!["b64".to_string()],
        }
    }

    /// Encode as base64url(JSON) for the envelope's `protected` field.
    pub fn encode(&self) -> Result<String, FormatError> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }

    /// Decode a `protected` field back into its structured form.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if `encoded` is not valid base64url or the
    /// decoded bytes are not a valid header.
    pub fn decode(encoded: &str) -> Result<Self, FormatError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// One stored signature file: header, embedded payload, and raw signature.
///
/// Envelopes are immutable once written; re-signing a package produces a new
/// envelope file for that signer, never an in-place mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Base64url-encoded [`ProtectedHeader`].
    pub protected: String,
    /// The signed payload, embedded as structured JSON (never encoded).
    pub payload: SignaturePayload,
    /// Base64url-encoded 64-byte raw `r || s` signature.
    pub signature: String,
    /// Recovery id of the signature (`0`/`1`; `27`/`28` accepted).
    ///
    /// Envelopes written before this field existed omit it; verifiers then
    /// fall back to the legacy fixed id of 27.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recid: Option<u8>,
}

impl SignatureEnvelope {
    /// Parse a stored signature file.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if the bytes are not valid JSON or a
    /// required field (`protected`, `payload`, `signature`) is absent.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize for persistence as a signature file.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Reconstruct the exact byte string that was hashed and signed.
    pub fn signing_input(&self) -> Result<Vec<u8>, FormatError> {
        self.payload.signing_input(&self.protected)
    }
}
