//! The encryption service object and its frozen parameters

use std::sync::Arc;

use secrecy::SecretString;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{self, DerivedKey, KdfParams, KeyDeriver, Pbkdf2Sha256};
use crate::{BLOCK_SIZE, FINGERPRINT_SIZE, SALT_SIZE};

/// Plaintext bytes per file chunk (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Parameters fixed for the lifetime of a [`CapsuleCrypto`].
///
/// Both values are part of the stored format. Tests lower
/// `kdf.iterations` for speed; production keeps the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoParams {
    pub kdf: KdfParams,
    /// Must be a non-zero multiple of the AES block size
    pub chunk_size: usize,
}

impl Default for CryptoParams {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CryptoParams {
    pub fn validate(&self) -> CryptoResult<()> {
        validate_chunk_size(self.chunk_size)?;
        if self.kdf.iterations == 0 {
            return Err(CryptoError::InvalidParams(
                "PBKDF2 iteration count must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_chunk_size(chunk_size: usize) -> CryptoResult<()> {
    if chunk_size == 0 || chunk_size % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidParams(format!(
            "chunk size must be a non-zero multiple of {BLOCK_SIZE}, got {chunk_size}"
        )));
    }
    Ok(())
}

/// Password-based encryption of capsule text and files.
///
/// Cheap to clone; clones share the key deriver. Text operations live in
/// `text.rs`, file operations in `file.rs`, async wrappers in `task.rs`.
pub struct CapsuleCrypto<D: KeyDeriver = Pbkdf2Sha256> {
    pub(crate) deriver: Arc<D>,
    pub(crate) chunk_size: usize,
}

impl<D: KeyDeriver> Clone for CapsuleCrypto<D> {
    fn clone(&self) -> Self {
        Self {
            deriver: Arc::clone(&self.deriver),
            chunk_size: self.chunk_size,
        }
    }
}

impl<D: KeyDeriver> std::fmt::Debug for CapsuleCrypto<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsuleCrypto")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl CapsuleCrypto<Pbkdf2Sha256> {
    /// Build the production service (PBKDF2-HMAC-SHA256).
    pub fn new(params: CryptoParams) -> CryptoResult<Self> {
        params.validate()?;
        Ok(Self {
            deriver: Arc::new(Pbkdf2Sha256::new(params.kdf)?),
            chunk_size: params.chunk_size,
        })
    }
}

impl<D: KeyDeriver> CapsuleCrypto<D> {
    /// Build the service around a custom key deriver.
    pub fn with_deriver(deriver: D, chunk_size: usize) -> CryptoResult<Self> {
        validate_chunk_size(chunk_size)?;
        Ok(Self {
            deriver: Arc::new(deriver),
            chunk_size,
        })
    }

    pub fn deriver(&self) -> &D {
        &self.deriver
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn derive_key(
        &self,
        password: &SecretString,
        salt: &[u8; SALT_SIZE],
    ) -> CryptoResult<DerivedKey> {
        self.deriver.derive(password, salt)
    }

    /// Check a password against a stored salt and fingerprint.
    pub fn verify_password(
        &self,
        password: &SecretString,
        salt: &[u8; SALT_SIZE],
        expected: &[u8; FINGERPRINT_SIZE],
    ) -> CryptoResult<bool> {
        kdf::verify_password(self.deriver.as_ref(), password, salt, expected)
    }

    /// Derive the key and fail with [`CryptoError::InvalidPassword`] unless its
    /// fingerprint matches.
    pub(crate) fn derive_checked(
        &self,
        password: &SecretString,
        salt: &[u8; SALT_SIZE],
        expected: &[u8; FINGERPRINT_SIZE],
    ) -> CryptoResult<DerivedKey> {
        let key = self.deriver.derive(password, salt)?;
        if &kdf::fingerprint(&key) != expected {
            return Err(CryptoError::InvalidPassword);
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = CryptoParams::default();
        assert_eq!(params.kdf.iterations, 100_000);
        assert_eq!(params.chunk_size, 1024 * 1024);
        params.validate().unwrap();
    }

    #[test]
    fn test_invalid_chunk_sizes() {
        for chunk_size in [0, 1, 15, 1000, 1024 * 1024 + 1] {
            let params = CryptoParams {
                chunk_size,
                ..CryptoParams::default()
            };
            assert!(
                CapsuleCrypto::new(params).is_err(),
                "chunk size {chunk_size} must be rejected"
            );
        }
    }

    #[test]
    fn test_clone_shares_deriver() {
        let crypto = CapsuleCrypto::new(CryptoParams::default()).unwrap();
        let clone = crypto.clone();
        assert!(Arc::ptr_eq(&crypto.deriver, &clone.deriver));
    }
}
