//! Chunked file encryption
//!
//! Blob format (envelope version 1):
//! ```text
//! [chunk 0 ciphertext][chunk 1 ciphertext]...[chunk N-1 ciphertext]
//! chunk i = AES-256-CBC(key, iv, plaintext[i*chunk_size .. (i+1)*chunk_size])
//! ```
//!
//! Every chunk is padded independently and encrypted with the same key and
//! IV. Because `chunk_size` is block-aligned, each full chunk encrypts to
//! exactly `chunk_size + 16` bytes; only the last chunk is shorter. A file no
//! larger than one chunk is a single pass, and an empty file is one chunk of
//! pure padding.
//!
//! Sharing the IV means two chunks that begin with identical plaintext
//! blocks also begin with identical ciphertext blocks. The format keeps it
//! for compatibility with existing blobs.

use secrecy::SecretString;

use crate::cipher::{ciphertext_len, decrypt_bytes, encrypt_bytes_with_iv, generate_iv};
use crate::envelope::{FileEncryptionEnvelope, ENVELOPE_VERSION};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{fingerprint, generate_salt, DerivedKey, KeyDeriver};
use crate::service::{validate_chunk_size, CapsuleCrypto};
use crate::{BLOCK_SIZE, IV_SIZE};

/// A decrypted file, or a file about to be encrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainFile {
    pub name: String,
    /// MIME type
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PlainFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

impl std::fmt::Debug for PlainFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Output of [`CapsuleCrypto::encrypt_file`]: the raw blob to store and the
/// envelope to keep next to it.
#[derive(Debug, Clone)]
pub struct EncryptedFile {
    pub blob: Vec<u8>,
    pub envelope: FileEncryptionEnvelope,
}

/// Chunk-level progress through a file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileProgress {
    pub completed: usize,
    pub total: usize,
}

impl FileProgress {
    /// `completed / total * 100`
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Number of chunks a plaintext of `len` bytes is split into (at least one).
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size).max(1)
}

/// Expected blob length for a plaintext of `len` bytes, or `None` if it
/// does not fit in `usize`.
pub fn encrypted_blob_len(len: usize, chunk_size: usize) -> Option<usize> {
    let full = chunk_count(len, chunk_size) - 1;
    let stride = chunk_size.checked_add(BLOCK_SIZE)?;
    let tail = len - full * chunk_size;
    tail.checked_add(BLOCK_SIZE)?;
    full.checked_mul(stride)?.checked_add(ciphertext_len(tail))
}

/// One encrypted chunk, yielded in input order.
#[derive(Debug, Clone)]
pub struct EncryptedChunk {
    pub index: usize,
    pub total: usize,
    pub bytes: Vec<u8>,
}

impl EncryptedChunk {
    pub fn progress(&self) -> FileProgress {
        FileProgress {
            completed: self.index + 1,
            total: self.total,
        }
    }
}

/// Streaming encryption of a file, one chunk per `next()`.
///
/// The envelope is known before the first chunk is produced. Dropping the
/// iterator early abandons the operation; chunks already yielded are useless
/// on their own.
pub struct EncryptChunks<'a> {
    key: DerivedKey,
    iv: [u8; IV_SIZE],
    data: &'a [u8],
    chunk_size: usize,
    next_index: usize,
    total: usize,
    envelope: FileEncryptionEnvelope,
}

impl EncryptChunks<'_> {
    pub fn envelope(&self) -> &FileEncryptionEnvelope {
        &self.envelope
    }

    pub fn total_chunks(&self) -> usize {
        self.total
    }
}

impl Iterator for EncryptChunks<'_> {
    type Item = EncryptedChunk;

    fn next(&mut self) -> Option<EncryptedChunk> {
        if self.next_index >= self.total {
            return None;
        }
        let index = self.next_index;
        let start = index * self.chunk_size;
        let end = (start + self.chunk_size).min(self.data.len());
        let bytes = encrypt_bytes_with_iv(&self.data[start..end], &self.key, &self.iv);
        self.next_index += 1;

        tracing::trace!(index, total = self.total, len = bytes.len(), "encrypted chunk");
        Some(EncryptedChunk {
            index,
            total: self.total,
            bytes,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EncryptChunks<'_> {}

/// Streaming decryption of a blob, one plaintext chunk per `next()`.
///
/// Stops after the first error.
pub struct DecryptChunks<'a> {
    key: DerivedKey,
    iv: [u8; IV_SIZE],
    blob: &'a [u8],
    encrypted_chunk_size: usize,
    next_index: usize,
    total: usize,
    failed: bool,
}

impl DecryptChunks<'_> {
    pub fn total_chunks(&self) -> usize {
        self.total
    }

    /// Progress after the chunk most recently yielded.
    pub fn progress(&self) -> FileProgress {
        FileProgress {
            completed: self.next_index,
            total: self.total,
        }
    }
}

impl Iterator for DecryptChunks<'_> {
    type Item = CryptoResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_index >= self.total {
            return None;
        }
        let start = self.next_index * self.encrypted_chunk_size;
        let end = (start + self.encrypted_chunk_size).min(self.blob.len());
        self.next_index += 1;

        let result = decrypt_bytes(&self.blob[start..end], &self.key, &self.iv);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl<D: KeyDeriver> CapsuleCrypto<D> {
    /// Start a streaming encryption of `file` under `password`.
    ///
    /// Salt, IV and key are generated here; iterate the result to produce the
    /// ciphertext chunks.
    pub fn encrypt_chunks<'a>(
        &self,
        file: &'a PlainFile,
        password: &SecretString,
    ) -> CryptoResult<EncryptChunks<'a>> {
        let salt = generate_salt();
        let iv = generate_iv();
        let key = self.derive_key(password, &salt)?;
        let total = chunk_count(file.data.len(), self.chunk_size);

        let envelope = FileEncryptionEnvelope {
            version: ENVELOPE_VERSION,
            iv,
            salt,
            key_fingerprint: fingerprint(&key),
            chunk_size: self.chunk_size,
            original_name: file.name.clone(),
            original_size: file.data.len() as u64,
            original_type: file.mime_type.clone(),
        };

        tracing::debug!(
            name = %file.name,
            size = file.data.len(),
            chunks = total,
            "encrypting file"
        );

        Ok(EncryptChunks {
            key,
            iv,
            data: &file.data,
            chunk_size: self.chunk_size,
            next_index: 0,
            total,
            envelope,
        })
    }

    /// Encrypt a whole file, calling `on_progress` after every chunk.
    ///
    /// A panic in `on_progress` abandons the operation; nothing partial is
    /// returned.
    pub fn encrypt_file(
        &self,
        file: &PlainFile,
        password: &SecretString,
        mut on_progress: impl FnMut(FileProgress),
    ) -> CryptoResult<EncryptedFile> {
        let mut chunks = self.encrypt_chunks(file, password)?;
        let mut blob = Vec::with_capacity(
            encrypted_blob_len(file.data.len(), self.chunk_size).unwrap_or_default(),
        );

        for chunk in chunks.by_ref() {
            blob.extend_from_slice(&chunk.bytes);
            on_progress(chunk.progress());
        }

        Ok(EncryptedFile {
            blob,
            envelope: chunks.envelope,
        })
    }

    /// Start a streaming decryption of `blob`.
    ///
    /// The password is checked against the envelope fingerprint first; a
    /// mismatch fails with [`CryptoError::InvalidPassword`] without touching
    /// the ciphertext. A blob whose length does not match the envelope fails
    /// with [`CryptoError::Decryption`].
    pub fn decrypt_chunks<'a>(
        &self,
        blob: &'a [u8],
        envelope: &FileEncryptionEnvelope,
        password: &SecretString,
    ) -> CryptoResult<DecryptChunks<'a>> {
        validate_chunk_size(envelope.chunk_size)
            .map_err(|e| CryptoError::Malformed(e.to_string()))?;
        let encrypted_chunk_size = envelope
            .chunk_size
            .checked_add(BLOCK_SIZE)
            .ok_or_else(|| CryptoError::Malformed("chunk size out of range".into()))?;
        let original_size = usize::try_from(envelope.original_size)
            .map_err(|_| CryptoError::Malformed("original size exceeds address space".into()))?;

        let key = self.derive_checked(password, &envelope.salt, &envelope.key_fingerprint)?;

        // Ciphertext is always longer than the plaintext; the first check
        // also keeps the length arithmetic below in range.
        if original_size >= blob.len()
            || encrypted_blob_len(original_size, envelope.chunk_size) != Some(blob.len())
        {
            tracing::debug!(
                blob_len = blob.len(),
                original_size,
                "blob length does not match envelope"
            );
            return Err(CryptoError::Decryption);
        }

        Ok(DecryptChunks {
            key,
            iv: envelope.iv,
            blob,
            encrypted_chunk_size,
            next_index: 0,
            total: chunk_count(original_size, envelope.chunk_size),
            failed: false,
        })
    }

    /// Decrypt a whole blob back into a [`PlainFile`] with its original name
    /// and MIME type, calling `on_progress` after every chunk.
    pub fn decrypt_file(
        &self,
        blob: &[u8],
        envelope: &FileEncryptionEnvelope,
        password: &SecretString,
        mut on_progress: impl FnMut(FileProgress),
    ) -> CryptoResult<PlainFile> {
        let mut chunks = self.decrypt_chunks(blob, envelope, password)?;
        let mut data = Vec::with_capacity(envelope.original_size as usize);

        while let Some(chunk) = chunks.next() {
            data.extend_from_slice(&chunk?);
            on_progress(chunks.progress());
        }

        if data.len() as u64 != envelope.original_size {
            return Err(CryptoError::Decryption);
        }

        tracing::debug!(name = %envelope.original_name, size = data.len(), "decrypted file");
        Ok(PlainFile {
            name: envelope.original_name.clone(),
            mime_type: envelope.original_type.clone(),
            data,
        })
    }
}
