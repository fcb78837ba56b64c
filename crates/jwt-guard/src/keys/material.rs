//! Verification key material.

use crate::errors::ValidationError;
use bytes::Bytes;
use jsonwebtoken::{Algorithm, DecodingKey};
use std::fmt;

const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// Opaque key bytes used to check a token signature.
///
/// Holds PEM text, DER bytes or an HMAC secret; which one is decided by the
/// algorithm at decode time. Cloning is cheap. Debug output is redacted since
/// HMAC keys are secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationKey(Bytes);

impl VerificationKey {
    pub fn new(material: impl Into<Bytes>) -> Self {
        Self(material.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the material looks like a PEM document.
    pub fn is_pem(&self) -> bool {
        let start = self
            .0
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.0.len());
        self.0
            .get(start..)
            .is_some_and(|rest| rest.starts_with(PEM_PREFIX))
    }

    /// Build a `DecodingKey` for the given algorithm.
    ///
    /// | Family | PEM | otherwise |
    /// |---|---|---|
    /// | HMAC | n/a | raw secret |
    /// | RSA / RSA-PSS | `from_rsa_pem` | `from_rsa_der` (PKCS#1) |
    /// | ECDSA | `from_ec_pem` | `from_ec_der` |
    /// | EdDSA | `from_ed_pem` | `from_ed_der` (raw public key) |
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidKey` if the PEM cannot be parsed for
    /// the algorithm's key family.
    pub fn decoding_key(&self, algorithm: Algorithm) -> Result<DecodingKey, ValidationError> {
        let material = self.as_bytes();
        let pem = self.is_pem();

        let result = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                Ok(DecodingKey::from_secret(material))
            }
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => {
                if pem {
                    DecodingKey::from_rsa_pem(material)
                } else {
                    Ok(DecodingKey::from_rsa_der(material))
                }
            }
            Algorithm::ES256 | Algorithm::ES384 => {
                if pem {
                    DecodingKey::from_ec_pem(material)
                } else {
                    Ok(DecodingKey::from_ec_der(material))
                }
            }
            Algorithm::EdDSA => {
                if pem {
                    DecodingKey::from_ed_pem(material)
                } else {
                    Ok(DecodingKey::from_ed_der(material))
                }
            }
        };

        result.map_err(|e| {
            tracing::warn!(
                target: "jwt_guard.keys",
                algorithm = ?algorithm,
                error = %e,
                "Verification key unusable for configured algorithm"
            );
            ValidationError::InvalidKey
        })
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationKey([REDACTED; {} bytes])", self.0.len())
    }
}

impl From<Bytes> for VerificationKey {
    fn from(material: Bytes) -> Self {
        Self(material)
    }
}

impl From<Vec<u8>> for VerificationKey {
    fn from(material: Vec<u8>) -> Self {
        Self(Bytes::from(material))
    }
}

impl From<String> for VerificationKey {
    fn from(material: String) -> Self {
        Self(Bytes::from(material))
    }
}

impl From<&str> for VerificationKey {
    fn from(material: &str) -> Self {
        Self(Bytes::copy_from_slice(material.as_bytes()))
    }
}

impl From<&[u8]> for VerificationKey {
    fn from(material: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(material))
    }
}
