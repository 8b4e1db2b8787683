//! Lockout scenarios driven through the public API with a counting key
//! deriver and a manual clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use capsule_core::CapsuleId;
use capsule_crypto::{
    CapsuleContent, CapsuleCrypto, CryptoResult, DerivedKey, KdfParams, KeyDeriver, Pbkdf2Sha256,
    DEFAULT_CHUNK_SIZE, SALT_SIZE,
};
use capsule_lock::{
    AttemptStore, CapsuleLock, JsonAttemptStore, LockError, LockState, ManualClock,
    MemoryAttemptStore,
};

/// Counts every key derivation.
struct CountingDeriver {
    inner: Pbkdf2Sha256,
    calls: Arc<AtomicUsize>,
}

impl KeyDeriver for CountingDeriver {
    fn derive(&self, password: &SecretString, salt: &[u8; SALT_SIZE]) -> CryptoResult<DerivedKey> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.derive(password, salt)
    }
}

fn counting_crypto() -> (CapsuleCrypto<CountingDeriver>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let deriver = CountingDeriver {
        inner: Pbkdf2Sha256::new(KdfParams { iterations: 1_000 }).unwrap(),
        calls: calls.clone(),
    };
    let crypto = CapsuleCrypto::with_deriver(deriver, DEFAULT_CHUNK_SIZE).unwrap();
    (crypto, calls)
}

fn pw(s: &str) -> SecretString {
    SecretString::from(s)
}

async fn protected(
    store: Arc<dyn AttemptStore>,
    clock: Arc<ManualClock>,
) -> (CapsuleLock<CountingDeriver>, Arc<AtomicUsize>) {
    let (crypto, calls) = counting_crypto();
    let mut lock = CapsuleLock::new(
        CapsuleId::from("journal-2026"),
        CapsuleContent::Plain(serde_json::json!({ "entry": "dear diary" })),
        crypto,
        store,
    )
    .with_clock(clock);
    lock.add_password_protection(pw("correct horse battery staple"))
        .await
        .unwrap();
    (lock, calls)
}

#[tokio::test]
async fn sixth_attempt_rejected_without_key_derivation() {
    let clock = Arc::new(ManualClock::default());
    let (mut lock, calls) = protected(Arc::new(MemoryAttemptStore::new()), clock.clone()).await;

    for i in 0..4 {
        clock.advance(Duration::from_secs(60));
        let err = lock.unlock(pw("guess")).await.unwrap_err();
        assert!(
            matches!(err, LockError::InvalidPassword { attempts_remaining } if attempts_remaining == 4 - i),
            "attempt {i}: {err:?}"
        );
    }

    clock.advance(Duration::from_secs(60));
    let err = lock.unlock(pw("guess")).await.unwrap_err();
    assert!(matches!(err, LockError::LockedOut { .. }));
    assert!(matches!(lock.state().unwrap(), LockState::LockedOut { .. }));

    let before = calls.load(Ordering::SeqCst);
    let err = lock
        .unlock(pw("correct horse battery staple"))
        .await
        .unwrap_err();
    assert!(matches!(err, LockError::LockedOut { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), before);

    assert!(matches!(
        lock.verify_password(pw("correct horse battery staple")).await,
        Err(LockError::LockedOut { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn lockout_is_thirty_minutes_from_last_failure() {
    let clock = Arc::new(ManualClock::default());
    let (mut lock, _) = protected(Arc::new(MemoryAttemptStore::new()), clock.clone()).await;

    for _ in 0..5 {
        clock.advance(Duration::from_secs(5 * 60));
        let _ = lock.unlock(pw("guess")).await;
    }

    // Four of the five failures are outside the trailing window by now; the
    // lockout still runs its full 30 minutes from the fifth.
    clock.advance(Duration::from_secs(29 * 60));
    match lock.unlock(pw("guess")).await.unwrap_err() {
        LockError::LockedOut { remaining } => assert_eq!(remaining, Duration::from_secs(60)),
        other => panic!("expected lockout, got {other:?}"),
    }
}

#[tokio::test]
async fn attempt_after_expiry_is_processed_and_success_clears_history() {
    let clock = Arc::new(ManualClock::default());
    let store: Arc<dyn AttemptStore> = Arc::new(MemoryAttemptStore::new());
    let (mut lock, calls) = protected(store.clone(), clock.clone()).await;
    let id = lock.id().clone();

    for _ in 0..5 {
        let _ = lock.unlock(pw("guess")).await;
    }
    assert_eq!(store.get(&id).unwrap().len(), 5);

    clock.advance(Duration::from_secs(30 * 60 + 1));
    let before = calls.load(Ordering::SeqCst);
    lock.unlock(pw("correct horse battery staple")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), before + 1);
    assert_eq!(lock.state().unwrap(), LockState::Unlocked);
    assert!(store.get(&id).unwrap().is_empty());
    assert_eq!(lock.plaintext(), Some(r#"{"entry":"dear diary"}"#));
}

#[tokio::test]
async fn wrong_password_after_expiry_starts_a_fresh_count() {
    let clock = Arc::new(ManualClock::default());
    let (mut lock, _) = protected(Arc::new(MemoryAttemptStore::new()), clock.clone()).await;

    for _ in 0..5 {
        let _ = lock.unlock(pw("guess")).await;
    }
    clock.advance(Duration::from_secs(31 * 60));

    let err = lock.unlock(pw("guess")).await.unwrap_err();
    assert!(matches!(
        err,
        LockError::InvalidPassword {
            attempts_remaining: 4
        }
    ));
}

#[tokio::test]
async fn lockout_survives_a_new_session_with_json_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("attempts.json");
    let clock = Arc::new(ManualClock::default());

    let (mut lock, _) = protected(
        Arc::new(JsonAttemptStore::open(&path).unwrap()),
        clock.clone(),
    )
    .await;
    for _ in 0..5 {
        let _ = lock.unlock(pw("guess")).await;
    }
    let content = lock.content().clone();
    drop(lock);

    // Fresh process: reopen the store and rebuild the lock from persisted content.
    let (crypto, calls) = counting_crypto();
    let mut lock = CapsuleLock::new(
        CapsuleId::from("journal-2026"),
        content,
        crypto,
        Arc::new(JsonAttemptStore::open(&path).unwrap()),
    )
    .with_clock(clock.clone());

    assert!(matches!(lock.state().unwrap(), LockState::LockedOut { .. }));
    assert!(matches!(
        lock.unlock(pw("correct horse battery staple")).await,
        Err(LockError::LockedOut { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    clock.advance(Duration::from_secs(30 * 60));
    lock.unlock(pw("correct horse battery staple")).await.unwrap();
}
