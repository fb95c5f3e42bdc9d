//! Signer address recovery from detached-payload envelopes.
//!
//! The signing input is reconstructed byte-for-byte from the stored envelope
//! (`protected || '.' || canonical payload JSON`), hashed with Keccak-256,
//! and the public key is recovered from the raw `r || s` signature plus a
//! recovery id. The recovered key is then reduced to its account address.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use pkgsig_schema::{Address, FormatError, SignatureEnvelope};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Recovery id assumed for envelopes that predate the explicit `recid`
/// field. The legacy scheme never transmitted which of the two candidate ids
/// produced the signature and always assumed this one.
pub const LEGACY_RECOVERY_ID: u8 = 27;

/// Reasons address recovery can fail. Callers fold every one of these into
/// [`SignerIdentity::Unrecoverable`]; none of them aborts verification.
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// The signing input could not be reconstructed from the envelope.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The signature field is not valid base64url.
    #[error("signature is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The signature did not decode to exactly 64 raw bytes.
    #[error("signature must decode to 64 bytes, got {0}")]
    Length(usize),

    /// The envelope carries a recovery id outside the valid range.
    #[error("recovery id {0} out of range")]
    RecoveryId(u8),

    /// The curve rejected the signature scalars or the recovered point.
    #[error("public key recovery failed: {0}")]
    Recovery(#[from] k256::ecdsa::Error),
}

/// Identity outcome of a recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerIdentity {
    /// The signer's recovered, normalized address.
    Address(Address),
    /// Recovery failed. Treat as never matching any expected signer.
    Unrecoverable,
}

impl SignerIdentity {
    /// The recovered address, if any.
    pub fn address(&self) -> Option<&Address> {
        match self {
            SignerIdentity::Address(address) => Some(address),
            SignerIdentity::Unrecoverable => None,
        }
    }
}

impl std::fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerIdentity::Address(address) => write!(f, "{address}"),
            SignerIdentity::Unrecoverable => write!(f, "unrecoverable"),
        }
    }
}

impl serde::Serialize for SignerIdentity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Derive the account address from a public key: the last 20 bytes of the
/// Keccak-256 digest of the uncompressed SEC1 point (tag byte dropped).
pub fn address_from_public_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut account = [0u8; 20];
    account.copy_from_slice(&digest[12..]);
    Address::from_account_bytes(account)
}

/// Map a wire recovery id (`0`/`1`, or `27`/`28` in the legacy offset form)
/// onto the curve's recovery id.
fn normalize_recovery_id(value: u8) -> Result<RecoveryId, RecoveryError> {
    let byte = if value >= 27 { value - 27 } else { value };
    RecoveryId::from_byte(byte).ok_or(RecoveryError::RecoveryId(value))
}

/// Attempt to recover the signer's address, surfacing the failure reason.
///
/// # Errors
///
/// Returns a [`RecoveryError`] describing the malformed field or curve
/// failure. Use [`recover_signer`] when the sentinel fold is wanted.
pub fn try_recover_address(envelope: &SignatureEnvelope) -> Result<Address, RecoveryError> {
    let hashed = keccak256(&envelope.signing_input()?);

    let decoded = URL_SAFE_NO_PAD.decode(&envelope.signature)?;
    if decoded.len() != 64 {
        return Err(RecoveryError::Length(decoded.len()));
    }
    let signature = Signature::from_slice(&decoded)?;

    let recovery_id = normalize_recovery_id(envelope.recid.unwrap_or(LEGACY_RECOVERY_ID))?;
    let key = VerifyingKey::recover_from_prehash(&hashed, &signature, recovery_id)?;
    Ok(address_from_public_key(&key))
}

/// Recover the signer identity, folding every failure into the sentinel.
pub fn recover_signer(envelope: &SignatureEnvelope) -> SignerIdentity {
    match try_recover_address(envelope) {
        Ok(address) => SignerIdentity::Address(address),
        Err(error) => {
            tracing::warn!(%error, "signature recovery failed");
            SignerIdentity::Unrecoverable
        }
    }
}
