use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures of the encryption core.
///
/// `InvalidPassword` and `Decryption` are deliberately indistinguishable to
/// end users; see [`CryptoError::user_message`].
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Fingerprint mismatch detected before decryption.
    #[error("invalid password")]
    InvalidPassword,

    /// Bad padding, truncated ciphertext, or non-UTF-8 plaintext. Wrong
    /// password and corrupted data look the same here.
    #[error("decryption failed: invalid password or corrupted data")]
    Decryption,

    /// Content could not be serialized; raised before any crypto work.
    #[error("cannot encrypt input: {0}")]
    EncryptionInput(String),

    #[error("invalid crypto parameters: {0}")]
    InvalidParams(String),

    /// Envelope fields that do not decode (bad base64, wrong lengths).
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// A blocking worker panicked or was cancelled.
    #[error("crypto task failed: {0}")]
    Task(String),
}

impl CryptoError {
    /// Message safe to show to the person typing the password.
    pub fn user_message(&self) -> String {
        match self {
            CryptoError::InvalidPassword | CryptoError::Decryption => "Invalid password.".into(),
            other => other.to_string(),
        }
    }

    /// True for the failures a wrong password can produce.
    pub fn is_password_failure(&self) -> bool {
        matches!(self, CryptoError::InvalidPassword | CryptoError::Decryption)
    }
}
