//! Per-capsule lock state machine
//!
//! ```text
//!  Unprotected --add_password_protection--> Locked
//!  Locked      --unlock ok-->               Unlocked   (history cleared)
//!  Locked      --unlock fails-->            Locked     (failure appended)
//!  Locked      --5th failure in window-->   LockedOut  (until last failure + 30 min)
//!  LockedOut   --any attempt-->             LockedOut  (no key derivation)
//!  LockedOut   --lockout expires-->         Locked     (history cleared)
//!  Unlocked    --lock-->                    Locked     (plaintext purged)
//!  Locked/Unlocked --remove_password_protection--> Unprotected
//! ```
//!
//! Lockout is enforced here, on the client. Anyone holding an envelope can
//! call the key deriver directly, so this is a deterrent at the prompt and
//! not a rate limit on an adversary.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use zeroize::Zeroizing;

use capsule_core::CapsuleId;
use capsule_crypto::{CapsuleContent, CapsuleCrypto, EncryptionEnvelope, KeyDeriver, Pbkdf2Sha256};

use crate::attempts::{AttemptStore, PasswordAttempt};
use crate::clock::{to_millis, Clock, SystemClock};
use crate::error::{LockError, LockResult};
use crate::policy::LockoutPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No password has been set
    Unprotected,
    Locked,
    /// Plaintext is cached for this session
    Unlocked,
    LockedOut { until: SystemTime },
}

/// Lock state for one capsule in one session.
///
/// Every operation that can touch the attempt history takes `&mut self`, so
/// the borrow checker serializes verifications against the same capsule.
/// The cached plaintext is zeroized when the capsule is locked or dropped.
pub struct CapsuleLock<D: KeyDeriver = Pbkdf2Sha256> {
    id: CapsuleId,
    content: CapsuleContent,
    cached: Option<Zeroizing<String>>,
    crypto: CapsuleCrypto<D>,
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl<D: KeyDeriver> std::fmt::Debug for CapsuleLock<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsuleLock")
            .field("id", &self.id)
            .field("protected", &self.content.is_encrypted())
            .field("unlocked", &self.cached.is_some())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<D: KeyDeriver + 'static> CapsuleLock<D> {
    pub fn new(
        id: CapsuleId,
        content: CapsuleContent,
        crypto: CapsuleCrypto<D>,
        store: Arc<dyn AttemptStore>,
    ) -> Self {
        Self {
            id,
            content,
            cached: None,
            crypto,
            store,
            clock: Arc::new(SystemClock),
            policy: LockoutPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: LockoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> &CapsuleId {
        &self.id
    }

    /// The persistable form. Never plaintext while protected.
    pub fn content(&self) -> &CapsuleContent {
        &self.content
    }

    pub fn is_protected(&self) -> bool {
        self.content.is_encrypted()
    }

    /// Current state. An expired lockout is cleared here and reported as
    /// [`LockState::Locked`].
    pub fn state(&mut self) -> LockResult<LockState> {
        if !self.content.is_encrypted() {
            return Ok(LockState::Unprotected);
        }
        if self.cached.is_some() {
            return Ok(LockState::Unlocked);
        }
        Ok(match self.active_lockout()? {
            Some(until) => LockState::LockedOut { until },
            None => LockState::Locked,
        })
    }

    /// Time left on the lockout in force, measured on this lock's clock.
    pub fn lockout_remaining(&mut self) -> LockResult<Option<Duration>> {
        let now = self.clock.now();
        Ok(self
            .active_lockout()?
            .map(|until| until.duration_since(now).unwrap_or_default()))
    }

    /// Failures left before lockout, counted over the trailing window.
    pub fn attempts_remaining(&self) -> LockResult<u32> {
        let attempts = self.store.get(&self.id)?;
        Ok(self.policy.attempts_remaining(&attempts, self.clock.now()))
    }

    /// Verify `password`, decrypt the content and cache it for the session.
    pub async fn unlock(&mut self, password: SecretString) -> LockResult<()> {
        let plaintext = self.attempt(password).await?;
        self.cached = Some(plaintext);
        info!(capsule = %self.id, "capsule unlocked");
        Ok(())
    }

    /// Check `password` with the same attempt bookkeeping as
    /// [`unlock`](Self::unlock), without decrypting or caching anything.
    ///
    /// Returns `Ok(false)` for a wrong password. A failure that triggers a
    /// lockout, or any attempt during one, is `Err(LockError::LockedOut)`.
    pub async fn verify_password(&mut self, password: SecretString) -> LockResult<bool> {
        let envelope = self.envelope()?.clone();
        self.guard_lockout()?;

        let ok = self
            .crypto
            .verify_password_async(password, envelope.salt, envelope.key_fingerprint)
            .await?;
        if ok {
            self.store.clear(&self.id)?;
            return Ok(true);
        }
        match self.record_failure()? {
            LockError::InvalidPassword { .. } => Ok(false),
            err => Err(err),
        }
    }

    /// Purge cached plaintext. A no-op unless unlocked.
    pub fn lock(&mut self) {
        if self.cached.take().is_some() {
            info!(capsule = %self.id, "capsule locked");
        }
    }

    /// Seal plain content under `password`. The capsule ends up locked.
    pub async fn add_password_protection(&mut self, password: SecretString) -> LockResult<()> {
        let value = match &self.content {
            CapsuleContent::Plain(value) => value,
            CapsuleContent::Encrypted(_) => return Err(LockError::AlreadyProtected),
        };
        let envelope = self.crypto.seal_content_async(value, password).await?;

        self.content = CapsuleContent::Encrypted(envelope);
        self.cached = None;
        self.store.clear(&self.id)?;
        info!(capsule = %self.id, "password protection added");
        Ok(())
    }

    /// Verify `password`, then restore the content to plain form.
    ///
    /// The verification counts as an attempt. Plaintext that is not JSON is
    /// kept as a JSON string.
    pub async fn remove_password_protection(&mut self, password: SecretString) -> LockResult<()> {
        let plaintext = self.attempt(password).await?;
        let value = serde_json::from_str(&plaintext)
            .unwrap_or_else(|_| serde_json::Value::String(plaintext.to_string()));

        self.content = CapsuleContent::Plain(value);
        self.cached = None;
        info!(capsule = %self.id, "password protection removed");
        Ok(())
    }

    /// Verify `current`, then re-seal under `new` with a fresh salt and IV.
    ///
    /// An unlocked capsule stays unlocked.
    pub async fn change_password(
        &mut self,
        current: SecretString,
        new: SecretString,
    ) -> LockResult<()> {
        let plaintext = self.attempt(current).await?;
        let envelope = self.crypto.encrypt_text_async(plaintext, new).await?;

        self.content = CapsuleContent::Encrypted(envelope);
        info!(capsule = %self.id, "password changed");
        Ok(())
    }

    /// Cached plaintext, if unlocked.
    pub fn plaintext(&self) -> Option<&str> {
        self.cached.as_ref().map(|p| p.as_str())
    }

    /// Deserialize the content. Plain content is always readable; protected
    /// content only while unlocked.
    pub fn content_as<T: DeserializeOwned>(&self) -> LockResult<T> {
        match (&self.content, &self.cached) {
            (CapsuleContent::Plain(value), _) => Ok(T::deserialize(value)?),
            (CapsuleContent::Encrypted(_), Some(plaintext)) => Ok(serde_json::from_str(plaintext)?),
            (CapsuleContent::Encrypted(_), None) => Err(LockError::Locked),
        }
    }

    fn envelope(&self) -> LockResult<&EncryptionEnvelope> {
        self.content.envelope().ok_or(LockError::NotProtected)
    }

    /// One counted verification: lockout check, derive and decrypt, then
    /// bookkeeping. The failure is persisted before the error is returned.
    async fn attempt(&mut self, password: SecretString) -> LockResult<Zeroizing<String>> {
        let envelope = self.envelope()?.clone();
        self.guard_lockout()?;

        match self.crypto.unlock_text_async(envelope, password).await {
            Ok(plaintext) => {
                self.store.clear(&self.id)?;
                Ok(plaintext)
            }
            Err(e) if e.is_password_failure() => Err(self.record_failure()?),
            Err(e) => Err(e.into()),
        }
    }

    fn guard_lockout(&mut self) -> LockResult<()> {
        if let Some(remaining) = self.lockout_remaining()? {
            warn!(
                capsule = %self.id,
                remaining_secs = remaining.as_secs(),
                "attempt rejected during lockout"
            );
            return Err(LockError::LockedOut { remaining });
        }
        Ok(())
    }

    /// End of the lockout in force right now. An expired lockout clears the
    /// attempt history.
    fn active_lockout(&mut self) -> LockResult<Option<SystemTime>> {
        let attempts = self.store.get(&self.id)?;
        let Some(until) = self.policy.lockout_until(&attempts) else {
            return Ok(None);
        };
        if self.clock.now() < until {
            return Ok(Some(until));
        }
        self.store.clear(&self.id)?;
        info!(capsule = %self.id, "lockout expired");
        Ok(None)
    }

    /// Append a failure and return the error to report for it. Failures that
    /// have left the window are dropped first.
    fn record_failure(&mut self) -> LockResult<LockError> {
        let now = self.clock.now();
        self.store
            .prune(&self.id, self.policy.window_start_ms(now))?;
        self.store
            .append(&self.id, PasswordAttempt::failure(to_millis(now)))?;

        let attempts = self.store.get(&self.id)?;
        if let Some(until) = self.policy.lockout_until(&attempts) {
            if now < until {
                let remaining = until.duration_since(now).unwrap_or_default();
                warn!(
                    capsule = %self.id,
                    lockout_secs = remaining.as_secs(),
                    "too many failed attempts, capsule locked out"
                );
                return Ok(LockError::LockedOut { remaining });
            }
        }

        let attempts_remaining = self.policy.attempts_remaining(&attempts, now);
        warn!(capsule = %self.id, attempts_remaining, "failed password attempt");
        Ok(LockError::InvalidPassword { attempts_remaining })
    }
}
