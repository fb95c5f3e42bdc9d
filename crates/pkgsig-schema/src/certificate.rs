//! Certificate and identity claim wire schema.
//!
//! A certificate associates an identity with a public key and/or claims. The
//! verification core treats all of this as opaque payload: no claim here is
//! validated against a trust root, and no chain-of-trust logic exists. The
//! schema ships so envelopes and tooling agree on the byte form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

/// Errors that can occur when decoding certificate wire codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// The numeric certificate type code is not registered.
    #[error("unknown certificate type code: {0}")]
    UnknownCertificateType(u16),

    /// The numeric identity type code is not registered.
    #[error("unknown identity type code: {0}")]
    UnknownIdentityType(u16),
}

/// Kind of credential a certificate carries. Serialized as its numeric wire
/// code; unknown codes are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum CertificateType {
    /// Binds a bare public key to an identity.
    PublicKey,
    /// Authorizes the key for code signing.
    CodeSign,
}

impl From<CertificateType> for u16 {
    fn from(value: CertificateType) -> Self {
        match value {
            CertificateType::PublicKey => 1,
            CertificateType::CodeSign => 3,
        }
    }
}

impl TryFrom<u16> for CertificateType {
    type Error = CertificateError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CertificateType::PublicKey),
            3 => Ok(CertificateType::CodeSign),
            other => Err(CertificateError::UnknownCertificateType(other)),
        }
    }
}

/// Kind of subject identity a certificate claims. Serialized as its numeric
/// wire code; git-hosting services occupy the 200 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum IdentityType {
    /// A bare account address.
    Address,
    /// An email address.
    Email,
    /// A GitHub account.
    Github,
    /// A GitLab account.
    Gitlab,
}

impl From<IdentityType> for u16 {
    fn from(value: IdentityType) -> Self {
        match value {
            IdentityType::Address => 1,
            IdentityType::Email => 2,
            IdentityType::Github => 200,
            IdentityType::Gitlab => 201,
        }
    }
}

impl TryFrom<u16> for IdentityType {
    type Error = CertificateError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IdentityType::Address),
            2 => Ok(IdentityType::Email),
            200 => Ok(IdentityType::Github),
            201 => Ok(IdentityType::Gitlab),
            other => Err(CertificateError::UnknownIdentityType(other)),
        }
    }
}

/// Services a hosted identity claim can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisteredService {
    /// `github.com` accounts.
    Github,
}

/// Human subject behind a certificate. This block is what a CA would vouch
/// for; the core never checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// Display name of the subject.
    pub name: String,
    /// Organization the subject belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Contact email address.
    pub email: String,
}

/// A service-hosted identity claim (e.g. a GitHub account).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    /// Optional entropy mixed into identity challenges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    /// The hosting service the claim refers to.
    pub name: RegisteredService,
    /// Account name on that service.
    pub username: String,
}

/// Short form of a certified key: just the derived address and algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShort {
    /// Account address derived from the public key.
    pub address: Address,
    /// Signature algorithm the key is used with.
    pub alg: String,
}

/// JWK form of a certified elliptic-curve public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcJwk {
    /// Key type, `"EC"` for elliptic-curve keys.
    pub kty: String,
    /// Curve identifier.
    pub crv: String,
    /// Base64url-encoded x coordinate.
    pub x: String,
    /// Base64url-encoded y coordinate.
    pub y: String,
    /// Optional key id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Public key material inside a certificate, in short or JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyMaterial {
    /// Address-plus-algorithm short form.
    Short(KeyShort),
    /// Full JWK form.
    Jwk(EcJwk),
}

/// Opaque client-side proof blob attached to a certificate. Reserved; the
/// core never interprets it.
pub type CertProof = serde_json::Value;

/// Options for a certificate signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrOptions {
    /// Identity type the request asks to be certified.
    #[serde(rename = "csrType")]
    pub csr_type: IdentityType,
}

/// A digital certificate payload: versioning, issuer, validity window,
/// subject claims, and the certified key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePayload {
    /// Certificate format version.
    pub version: u32,
    /// Unique token id.
    pub jti: String,
    /// Certificate type code.
    pub typ: CertificateType,
    /// Issuer URI, or `"self"` for self-issued certificates.
    pub iss: String,
    /// Issued-at, UNIX timestamp in seconds.
    pub iat: i64,
    /// Expiry, UNIX timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Not-before, UNIX timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Identity type code of the subject.
    pub id_typ: IdentityType,
    /// Subject identifier.
    pub sub: String,
    /// Subject details, present when a CA has validated them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectInfo>,
    /// Hosted-service identity claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<IdentityInfo>,
    /// The certified public key.
    pub key: KeyMaterial,
    /// Reserved proof blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CertProof>,
}
