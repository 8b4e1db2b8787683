//! Async entry points
//!
//! Key derivation and bulk encryption are CPU-bound and would stall an
//! async executor. Each `*_async` method moves its inputs onto tokio's
//! blocking pool and awaits the result. Dropping the returned future stops
//! waiting but does not stop work already running on the pool.

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use zeroize::Zeroizing;

use crate::envelope::{EncryptionEnvelope, FileEncryptionEnvelope};
use crate::error::{CryptoError, CryptoResult};
use crate::file::{EncryptedFile, FileProgress, PlainFile};
use crate::kdf::KeyDeriver;
use crate::service::CapsuleCrypto;
use crate::{FINGERPRINT_SIZE, SALT_SIZE};

/// Run `f` on the blocking pool, mapping a panic or cancellation to
/// [`CryptoError::Task`].
pub async fn run_blocking<T, F>(f: F) -> CryptoResult<T>
where
    F: FnOnce() -> CryptoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CryptoError::Task(e.to_string()))?
}

/// Forward progress to an optional channel. A dropped receiver is ignored.
fn report(progress: &Option<UnboundedSender<FileProgress>>, p: FileProgress) {
    if let Some(tx) = progress {
        let _ = tx.send(p);
    }
}

impl<D: KeyDeriver + 'static> CapsuleCrypto<D> {
    pub async fn encrypt_text_async(
        &self,
        plaintext: Zeroizing<String>,
        password: SecretString,
    ) -> CryptoResult<EncryptionEnvelope> {
        let this = self.clone();
        run_blocking(move || this.encrypt_text(&plaintext, &password)).await
    }

    pub async fn decrypt_text_async(
        &self,
        envelope: EncryptionEnvelope,
        password: SecretString,
    ) -> CryptoResult<String> {
        let this = self.clone();
        run_blocking(move || this.decrypt_text(&envelope, &password)).await
    }

    pub async fn unlock_text_async(
        &self,
        envelope: EncryptionEnvelope,
        password: SecretString,
    ) -> CryptoResult<Zeroizing<String>> {
        let this = self.clone();
        run_blocking(move || this.unlock_text(&envelope, &password)).await
    }

    /// Serializes on the calling task (so input errors surface before any
    /// blocking work is scheduled), then encrypts on the pool.
    pub async fn seal_content_async<T: Serialize + ?Sized>(
        &self,
        content: &T,
        password: SecretString,
    ) -> CryptoResult<EncryptionEnvelope> {
        let json = Zeroizing::new(
            serde_json::to_string(content)
                .map_err(|e| CryptoError::EncryptionInput(e.to_string()))?,
        );
        self.encrypt_text_async(json, password).await
    }

    pub async fn verify_password_async(
        &self,
        password: SecretString,
        salt: [u8; SALT_SIZE],
        expected: [u8; FINGERPRINT_SIZE],
    ) -> CryptoResult<bool> {
        let this = self.clone();
        run_blocking(move || this.verify_password(&password, &salt, &expected)).await
    }

    /// Encrypt a file on the blocking pool, sending a [`FileProgress`] per
    /// chunk to `progress` if given.
    pub async fn encrypt_file_async(
        &self,
        file: PlainFile,
        password: SecretString,
        progress: Option<UnboundedSender<FileProgress>>,
    ) -> CryptoResult<EncryptedFile> {
        let this = self.clone();
        run_blocking(move || this.encrypt_file(&file, &password, |p| report(&progress, p))).await
    }

    pub async fn decrypt_file_async(
        &self,
        blob: Vec<u8>,
        envelope: FileEncryptionEnvelope,
        password: SecretString,
        progress: Option<UnboundedSender<FileProgress>>,
    ) -> CryptoResult<PlainFile> {
        let this = self.clone();
        run_blocking(move || {
            this.decrypt_file(&blob, &envelope, &password, |p| report(&progress, p))
        })
        .await
    }
}
