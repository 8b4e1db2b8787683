//! Text payload encryption
//!
//! Pipeline: fresh salt → derive key → fresh IV → AES-256-CBC(UTF-8 bytes)
//! → base64 ciphertext → envelope with SHA-256 key fingerprint.
//!
//! There is no MAC. On decryption a wrong password is caught by bad padding
//! or non-UTF-8 output; garbage that happens to pass both is accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{decrypt_bytes, encrypt_bytes};
use crate::envelope::{EncryptionEnvelope, ENVELOPE_VERSION};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{fingerprint, generate_salt, DerivedKey, KeyDeriver};
use crate::service::CapsuleCrypto;

impl<D: KeyDeriver> CapsuleCrypto<D> {
    /// Encrypt a UTF-8 string under `password`.
    ///
    /// Not deterministic: salt and IV are fresh on every call, so encrypting
    /// the same text twice gives different envelopes.
    pub fn encrypt_text(
        &self,
        plaintext: &str,
        password: &SecretString,
    ) -> CryptoResult<EncryptionEnvelope> {
        let salt = generate_salt();
        let key = self.derive_key(password, &salt)?;
        let (ciphertext, iv) = encrypt_bytes(plaintext.as_bytes(), &key);

        tracing::debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "encrypted text payload"
        );

        Ok(EncryptionEnvelope {
            version: ENVELOPE_VERSION,
            ciphertext: STANDARD.encode(&ciphertext),
            iv,
            salt,
            key_fingerprint: fingerprint(&key),
        })
    }

    /// Decrypt an envelope produced by [`encrypt_text`](Self::encrypt_text).
    ///
    /// No fingerprint pre-check: a wrong password surfaces as
    /// [`CryptoError::Decryption`], indistinguishable from corrupted data.
    pub fn decrypt_text(
        &self,
        envelope: &EncryptionEnvelope,
        password: &SecretString,
    ) -> CryptoResult<String> {
        let key = self.derive_key(password, &envelope.salt)?;
        decrypt_with_key(envelope, &key).map(|plaintext| plaintext.to_string())
    }

    /// Fingerprint-checked decryption for the lock state machine.
    ///
    /// Fails fast with [`CryptoError::InvalidPassword`] on a fingerprint
    /// mismatch. The result is zeroized on drop.
    pub fn unlock_text(
        &self,
        envelope: &EncryptionEnvelope,
        password: &SecretString,
    ) -> CryptoResult<Zeroizing<String>> {
        let key = self.derive_checked(password, &envelope.salt, &envelope.key_fingerprint)?;
        decrypt_with_key(envelope, &key)
    }

    /// Serialize `content` to JSON and encrypt it.
    ///
    /// Serialization runs first; content that cannot be represented as JSON
    /// fails with [`CryptoError::EncryptionInput`] before any key derivation.
    pub fn seal_content<T: Serialize + ?Sized>(
        &self,
        content: &T,
        password: &SecretString,
    ) -> CryptoResult<EncryptionEnvelope> {
        let json = Zeroizing::new(
            serde_json::to_string(content)
                .map_err(|e| CryptoError::EncryptionInput(e.to_string()))?,
        );
        self.encrypt_text(&json, password)
    }

    /// Decrypt an envelope and deserialize the JSON inside it.
    pub fn open_content<T: DeserializeOwned>(
        &self,
        envelope: &EncryptionEnvelope,
        password: &SecretString,
    ) -> CryptoResult<T> {
        let key = self.derive_key(password, &envelope.salt)?;
        let json = decrypt_with_key(envelope, &key)?;
        // Valid UTF-8 that is not our JSON is still a wrong key as far as
        // the caller is concerned.
        serde_json::from_str(&json).map_err(|_| CryptoError::Decryption)
    }
}

fn decrypt_with_key(
    envelope: &EncryptionEnvelope,
    key: &DerivedKey,
) -> CryptoResult<Zeroizing<String>> {
    let ciphertext = envelope.ciphertext_bytes()?;
    let plaintext = decrypt_bytes(&ciphertext, key, &envelope.iv)?;
    match String::from_utf8(plaintext) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(err) => {
            err.into_bytes().zeroize();
            Err(CryptoError::Decryption)
        }
    }
}
