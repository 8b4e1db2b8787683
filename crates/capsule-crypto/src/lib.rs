//! capsule-crypto: Client-side encryption for capsule-vault
//!
//! Architecture: password → PBKDF2-HMAC-SHA256 → AES-256-CBC
//!
//! Text pipeline: UTF-8 → encrypt → base64 → [`EncryptionEnvelope`]
//! File pipeline: bytes → 1 MiB chunks → encrypt each (shared IV) → concatenated blob
//!                + [`FileEncryptionEnvelope`]
//!
//! Envelope fields:
//! ```text
//! salt             16 bytes, random per envelope, input to PBKDF2
//! iv               16 bytes, random per envelope
//! key_fingerprint  SHA-256(derived key), checks a password without decrypting
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod file;
pub mod kdf;
pub mod password;
pub mod service;
pub mod task;
mod text;

pub use cipher::{decrypt_bytes, encrypt_bytes};
pub use envelope::{CapsuleContent, EncryptionEnvelope, FileEncryptionEnvelope, ENVELOPE_VERSION};
pub use error::{CryptoError, CryptoResult};
pub use file::{EncryptedFile, FileProgress, PlainFile};
pub use kdf::{derive_key, fingerprint, verify_password, DerivedKey, KdfParams, KeyDeriver, Pbkdf2Sha256};
pub use password::{check_password_strength, generate_secure_password, PasswordStrength};
pub use service::{CapsuleCrypto, CryptoParams, DEFAULT_CHUNK_SIZE};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a PBKDF2 salt
pub const SALT_SIZE: usize = 16;

/// Size of an AES-CBC initialization vector
pub const IV_SIZE: usize = 16;

/// AES block size
pub const BLOCK_SIZE: usize = 16;

/// Size of a SHA-256 key fingerprint
pub const FINGERPRINT_SIZE: usize = 32;
