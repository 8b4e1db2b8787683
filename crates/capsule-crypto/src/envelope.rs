//! Persisted envelope formats
//!
//! Envelopes are opaque to the persistence layer: it stores them and hands
//! them back unchanged. Binary fields are base64 strings on the wire.
//!
//! ```json
//! {
//!   "version": 1,
//!   "ciphertext": "<base64>",
//!   "iv": "<base64, 16 bytes>",
//!   "salt": "<base64, 16 bytes>",
//!   "key_fingerprint": "<base64, 32 bytes>"
//! }
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::{FINGERPRINT_SIZE, IV_SIZE, SALT_SIZE};

/// Envelope format version.
///
/// Version 1 encrypts every chunk of a file with the same key and IV.
pub const ENVELOPE_VERSION: u32 = 1;

/// An encrypted text payload. Immutable once created; re-encryption or a
/// password change replaces it wholesale with fresh salt, iv and fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionEnvelope {
    pub version: u32,
    /// Base64 of the AES-256-CBC ciphertext
    pub ciphertext: String,
    #[serde(with = "base64_array")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "base64_array")]
    pub salt: [u8; SALT_SIZE],
    /// SHA-256 of the derived key
    #[serde(with = "base64_array")]
    pub key_fingerprint: [u8; FINGERPRINT_SIZE],
}

impl EncryptionEnvelope {
    /// Decode the base64 ciphertext into raw bytes.
    pub fn ciphertext_bytes(&self) -> CryptoResult<Vec<u8>> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| CryptoError::Malformed(format!("ciphertext base64: {e}")))
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CryptoError::Malformed(format!("envelope serialization: {e}")))
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let envelope: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::Malformed(format!("envelope deserialization: {e}")))?;
        envelope.check_version()?;
        Ok(envelope)
    }

    fn check_version(&self) -> CryptoResult<()> {
        check_version(self.version)
    }
}

/// Metadata stored next to an encrypted file blob.
///
/// The blob itself is raw ciphertext (concatenated chunks), not base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEncryptionEnvelope {
    pub version: u32,
    #[serde(with = "base64_array")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "base64_array")]
    pub salt: [u8; SALT_SIZE],
    #[serde(with = "base64_array")]
    pub key_fingerprint: [u8; FINGERPRINT_SIZE],
    /// Plaintext bytes per chunk at encryption time
    pub chunk_size: usize,
    pub original_name: String,
    pub original_size: u64,
    /// MIME type
    pub original_type: String,
}

impl FileEncryptionEnvelope {
    pub fn to_json(&self) -> CryptoResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CryptoError::Malformed(format!("file envelope serialization: {e}")))
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let envelope: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::Malformed(format!("file envelope deserialization: {e}")))?;
        check_version(envelope.version)?;
        Ok(envelope)
    }
}

fn check_version(version: u32) -> CryptoResult<()> {
    if version != ENVELOPE_VERSION {
        return Err(CryptoError::Malformed(format!(
            "unsupported envelope version {version} (expected {ENVELOPE_VERSION})"
        )));
    }
    Ok(())
}

/// Capsule content as persisted: either plain structured data or an
/// encrypted envelope. Callers must match on it, so protected content can
/// never be read as plain by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CapsuleContent {
    Plain(serde_json::Value),
    Encrypted(EncryptionEnvelope),
}

impl CapsuleContent {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, CapsuleContent::Encrypted(_))
    }

    pub fn envelope(&self) -> Option<&EncryptionEnvelope> {
        match self {
            CapsuleContent::Encrypted(envelope) => Some(envelope),
            CapsuleContent::Plain(_) => None,
        }
    }
}

/// Serde adapter: `[u8; N]` as a base64 string.
mod base64_array {
    use super::STANDARD;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(s.as_bytes()).map_err(de::Error::custom)?;
        bytes.try_into().map_err(|v: Vec<u8>| {
            de::Error::custom(format!("expected {N} bytes, got {}", v.len()))
        })
    }
}
