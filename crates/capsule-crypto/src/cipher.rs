//! AES-256-CBC with PKCS#7 padding
//!
//! There is no authentication tag. The only integrity signals are a valid
//! padding block and, for text, valid UTF-8; a wrong key is detected only
//! because it almost always produces garbage padding.
//!
//! Ciphertext length is always `(plaintext_len / 16 + 1) * 16`: an input
//! that is already block-aligned gains one full padding block.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::DerivedKey;
use crate::{BLOCK_SIZE, IV_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Generate a fresh random IV from the OS CSPRNG.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` under `key` with a freshly generated IV.
///
/// Returns `(ciphertext, iv)`; the IV must be stored with the ciphertext.
pub fn encrypt_bytes(plaintext: &[u8], key: &DerivedKey) -> (Vec<u8>, [u8; IV_SIZE]) {
    let iv = generate_iv();
    let ciphertext = encrypt_bytes_with_iv(plaintext, key, &iv);
    (ciphertext, iv)
}

/// Encrypt with a caller-supplied IV.
///
/// Only the chunked file format uses this, to share one IV across chunks.
pub fn encrypt_bytes_with_iv(plaintext: &[u8], key: &DerivedKey, iv: &[u8; IV_SIZE]) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt AES-256-CBC ciphertext and strip PKCS#7 padding.
///
/// Fails with [`CryptoError::Decryption`] when the length is not a positive
/// multiple of the block size or the padding is invalid.
pub fn decrypt_bytes(
    ciphertext: &[u8],
    key: &DerivedKey,
    iv: &[u8; IV_SIZE],
) -> CryptoResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption);
    }

    Aes256CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Size of the ciphertext produced for `plaintext_len` bytes.
pub fn ciphertext_len(plaintext_len: usize) -> usize {
    (plaintext_len / BLOCK_SIZE + 1) * BLOCK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    fn test_key() -> DerivedKey {
        DerivedKey::from_bytes([0x42u8; KEY_SIZE])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"hello, encrypted world!";

        let (ciphertext, iv) = encrypt_bytes(plaintext, &key);
        let decrypted = decrypt_bytes(&ciphertext, &key, &iv).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = test_key();

        let (ciphertext, iv) = encrypt_bytes(b"", &key);
        assert_eq!(ciphertext.len(), BLOCK_SIZE, "empty input is one padding block");

        let decrypted = decrypt_bytes(&ciphertext, &key, &iv).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let key = test_key();
        let (ct1, iv1) = encrypt_bytes(b"same input", &key);
        let (ct2, iv2) = encrypt_bytes(b"same input", &key);

        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let key1 = test_key();
        let key2 = DerivedKey::from_bytes([0x24u8; KEY_SIZE]);
        let plaintext = vec![0x5Au8; 256];

        let (ciphertext, iv) = encrypt_bytes(&plaintext, &key1);
        match decrypt_bytes(&ciphertext, &key2, &iv) {
            Err(CryptoError::Decryption) => {}
            // Padding can validate by chance; the bytes still must not match.
            Ok(garbage) => assert_ne!(garbage, plaintext),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_encrypted_size() {
        let key = test_key();

        for (len, expected) in [(0, 16), (1, 16), (15, 16), (16, 32), (1000, 1008)] {
            let ciphertext = encrypt_bytes_with_iv(&vec![0u8; len], &key, &[0u8; IV_SIZE]);
            assert_eq!(ciphertext.len(), expected, "plaintext length {len}");
            assert_eq!(ciphertext_len(len), expected);
        }
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let key = test_key();
        let (ciphertext, iv) = encrypt_bytes(b"some secret data here", &key);

        assert!(matches!(
            decrypt_bytes(&ciphertext[..ciphertext.len() - 1], &key, &iv),
            Err(CryptoError::Decryption)
        ));
        assert!(matches!(
            decrypt_bytes(&[], &key, &iv),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_tampered_padding_rejected() {
        let key = test_key();
        let iv = [9u8; IV_SIZE];
        // 16 bytes in → 32 bytes out, the last block is pure padding
        let mut ciphertext = encrypt_bytes_with_iv(&[1u8; 16], &key, &iv);
        // Corrupting the second-to-last block flips bits in the padding block
        ciphertext[15] ^= 0x01;

        assert!(matches!(
            decrypt_bytes(&ciphertext, &key, &iv),
            Err(CryptoError::Decryption)
        ));
    }
}
