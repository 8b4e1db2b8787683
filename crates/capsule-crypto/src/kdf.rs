//! Key derivation: PBKDF2-HMAC-SHA256 password → 256-bit key
//!
//! The iteration count is part of the envelope format. Every envelope ever
//! written with a given count needs the same count to decrypt, so it lives in
//! [`KdfParams`] and is injected once rather than repeated at call sites.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::{FINGERPRINT_SIZE, KEY_SIZE, SALT_SIZE};

/// Production PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// A 256-bit key derived from a password.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// HMAC-SHA256 rounds (default: 100000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Turns a password and salt into a key.
///
/// Implemented by [`Pbkdf2Sha256`] in production. Callers that need to
/// observe derivation (the lock state machine's tests count calls) wrap it.
pub trait KeyDeriver: Send + Sync {
    fn derive(&self, password: &SecretString, salt: &[u8; SALT_SIZE]) -> CryptoResult<DerivedKey>;
}

/// PBKDF2-HMAC-SHA256 with a fixed iteration count.
#[derive(Debug, Clone, Default)]
pub struct Pbkdf2Sha256 {
    params: KdfParams,
}

impl Pbkdf2Sha256 {
    pub fn new(params: KdfParams) -> CryptoResult<Self> {
        validate(&params)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl KeyDeriver for Pbkdf2Sha256 {
    fn derive(&self, password: &SecretString, salt: &[u8; SALT_SIZE]) -> CryptoResult<DerivedKey> {
        derive_key(password, salt, &self.params)
    }
}

fn validate(params: &KdfParams) -> CryptoResult<()> {
    if params.iterations == 0 {
        return Err(CryptoError::InvalidParams(
            "PBKDF2 iteration count must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Derive a 256-bit key from a password and salt using PBKDF2-HMAC-SHA256.
///
/// Deterministic: the same (password, salt, params) always yields the same key.
/// The salt is stored next to the ciphertext; it does not need to be secret.
pub fn derive_key(
    password: &SecretString,
    salt: &[u8],
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    validate(params)?;

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        params.iterations,
        &mut key,
    );
    let derived = DerivedKey::from_bytes(key);
    key.zeroize();

    tracing::trace!(iterations = params.iterations, "derived key");
    Ok(derived)
}

/// Generate a fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// SHA-256 of the derived key. Lets a password be checked without storing
/// or transmitting the key itself.
pub fn fingerprint(key: &DerivedKey) -> [u8; FINGERPRINT_SIZE] {
    Sha256::digest(key.as_bytes()).into()
}

/// Re-derive from `password` and `salt` and compare against a stored fingerprint.
///
/// Not constant-time.
pub fn verify_password(
    deriver: &dyn KeyDeriver,
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    expected: &[u8; FINGERPRINT_SIZE],
) -> CryptoResult<bool> {
    let key = deriver.derive(password, salt)?;
    Ok(&fingerprint(&key) == expected)
}
