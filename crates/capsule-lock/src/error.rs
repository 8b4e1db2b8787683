use std::time::Duration;

use capsule_crypto::CryptoError;
use thiserror::Error;

pub type LockResult<T> = Result<T, LockError>;

#[derive(Debug, Error)]
pub enum LockError {
    /// Wrong password or undecryptable content; the two are not told apart.
    #[error("invalid password ({attempts_remaining} attempts remaining)")]
    InvalidPassword { attempts_remaining: u32 },

    /// Rejected without consulting the key deriver.
    #[error("too many failed attempts, locked for another {}s", .remaining.as_secs())]
    LockedOut { remaining: Duration },

    #[error("capsule is not password protected")]
    NotProtected,

    #[error("capsule is already password protected")]
    AlreadyProtected,

    #[error("capsule is locked")]
    Locked,

    #[error("capsule content does not match the requested type: {0}")]
    Content(#[from] serde_json::Error),

    #[error("attempt store: {0}")]
    Store(#[from] anyhow::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl LockError {
    /// Message for the person at the password prompt.
    pub fn user_message(&self) -> String {
        match self {
            LockError::InvalidPassword { attempts_remaining } => format!(
                "Invalid password. {attempts_remaining} attempt{} remaining.",
                if *attempts_remaining == 1 { "" } else { "s" }
            ),
            LockError::LockedOut { remaining } => {
                let secs = remaining.as_secs();
                format!(
                    "Too many failed attempts. Try again in {}:{:02}.",
                    secs / 60,
                    secs % 60
                )
            }
            LockError::Crypto(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
