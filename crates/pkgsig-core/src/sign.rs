//! Payload assembly and detached-envelope signing.
//!
//! Key custody stays with the caller: signing takes an externally held
//! secp256k1 key and produces a persistable envelope. The payload travels
//! unencoded next to the signature; only its canonical JSON form enters the
//! signing input.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use k256::ecdsa::SigningKey;
use pkgsig_schema::{
    DigestAlgorithm, ISSUER_SELF, PAYLOAD_VERSION, ProtectedHeader, SignatureEnvelope,
    SignaturePayload,
};

use crate::digest::calculate_digests;
use crate::recover::keccak256;
use crate::store::PackageStore;

/// Default validity window written into payloads, in seconds.
pub const DEFAULT_VALIDITY_SECS: i64 = 24 * 60 * 60;

/// Configuration for one signing operation.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Content-digest algorithm for the payload's digest table.
    pub algorithm: DigestAlgorithm,
    /// Issuer written into the payload. [`ISSUER_SELF`] for self-signed
    /// envelopes.
    pub issuer: String,
    /// Validity window added to the issue time, in seconds.
    pub valid_for: i64,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            issuer: ISSUER_SELF.to_string(),
            valid_for: DEFAULT_VALIDITY_SECS,
        }
    }
}

/// Build the payload to be signed for the package's current state: fresh
/// digests under the configured algorithm, plus version, issuer, and expiry.
///
/// The same payload serialization (canonical JSON) is also the content of the
/// checksum manifest file.
///
/// # Errors
///
/// Propagates store I/O failures from digest computation.
pub async fn build_payload(
    store: &dyn PackageStore,
    options: &SignOptions,
) -> Result<SignaturePayload> {
    let data = calculate_digests(store, options.algorithm).await?;
    Ok(SignaturePayload {
        version: PAYLOAD_VERSION,
        iss: options.issuer.clone(),
        exp: Utc::now().timestamp() + options.valid_for,
        data,
    })
}

/// Sign `payload` with `key`, producing a persistable envelope.
///
/// Hashes `protected || '.' || canonical payload JSON` with Keccak-256 and
/// signs the digest with deterministic ECDSA. The signature's actual
/// recovery id is recorded in the envelope, so verifiers never have to
/// assume the legacy fixed id.
///
/// # Errors
///
/// Fails if the payload cannot be serialized or the key rejects the digest.
pub fn sign_payload(payload: SignaturePayload, key: &SigningKey) -> Result<SignatureEnvelope> {
    let protected = ProtectedHeader::es256k_recoverable().encode()?;
    let hashed = keccak256(&payload.signing_input(&protected)?);
    let (signature, recovery_id) = key.sign_prehash_recoverable(&hashed)?;

    Ok(SignatureEnvelope {
        protected,
        payload,
        signature: URL_SAFE_NO_PAD.encode(signature.to_bytes()),
        recid: Some(recovery_id.to_byte()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPackage;
    use pkgsig_schema::ALG_ES256K_R;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe512961708279df95b6a3d9e1f3a2c6";

    fn test_key() -> SigningKey {
        SigningKey::from_slice(&hex::decode(TEST_KEY).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn payload_carries_fresh_digests() {
        let pkg = MemoryPackage::new()
            .with_file("a.txt", "hello")
            .with_file("_META_/_checksums.json", "{}");

        let payload = build_payload(&pkg, &SignOptions::default()).await.unwrap();
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.iss, ISSUER_SELF);
        assert!(payload.exp > Utc::now().timestamp());

        let files = payload.data.algorithm("sha512").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("a.txt"));
    }

    #[tokio::test]
    async fn signed_envelope_is_well_formed() {
        let pkg = MemoryPackage::new().with_file("a.txt", "hello");
        let payload = build_payload(&pkg, &SignOptions::default()).await.unwrap();
        let envelope = sign_payload(payload, &test_key()).unwrap();

        let header = ProtectedHeader::decode(&envelope.protected).unwrap();
        assert_eq!(header.alg, ALG_ES256K_R);
        assert!(!header.b64);

        let raw = URL_SAFE_NO_PAD.decode(&envelope.signature).unwrap();
        assert_eq!(raw.len(), 64);
        assert!(matches!(envelope.recid, Some(0 | 1)));
    }

    #[test]
    fn signing_is_deterministic() {
        let mut data = pkgsig_schema::DigestSet::new();
        data.insert(
            DigestAlgorithm::Sha512,
            "a.txt",
            pkgsig_schema::HexDigest::new("aa").unwrap(),
        );
        let payload = SignaturePayload {
            version: PAYLOAD_VERSION,
            iss: ISSUER_SELF.to_string(),
            exp: 1_700_000_000,
            data,
        };

        let first = sign_payload(payload.clone(), &test_key()).unwrap();
        let second = sign_payload(payload, &test_key()).unwrap();
        assert_eq!(first.signature, second.signature);
        assert_eq!(first.recid, second.recid);
    }
}
