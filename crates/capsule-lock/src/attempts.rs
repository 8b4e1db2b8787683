//! Per-capsule password attempt history
//!
//! Two backends are available:
//!   - **Memory**: lives as long as the session that owns it.
//!   - **JSON**: one file for all capsules, rewritten atomically via
//!     temp+rename on every change, so lockouts survive restarts of the CLI.
//!
//! The record format is owned by this crate; callers treat it as opaque.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use capsule_core::CapsuleId;

/// One verification attempt.
///
/// Only failures are ever stored. A successful attempt clears the history
/// instead, so `success` is always `false` in records written by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordAttempt {
    /// Unix timestamp in milliseconds
    pub timestamp_ms: u64,
    pub success: bool,
}

impl PasswordAttempt {
    pub fn failure(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            success: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn success(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            success: true,
        }
    }
}

/// Storage for attempt history, keyed by capsule.
///
/// Appends for one capsule must be serialized by the caller; the lock state
/// machine does this by taking `&mut self` for every verification.
pub trait AttemptStore: Send + Sync {
    /// All recorded attempts for a capsule, oldest first.
    fn get(&self, capsule: &CapsuleId) -> Result<Vec<PasswordAttempt>>;
    fn append(&self, capsule: &CapsuleId, attempt: PasswordAttempt) -> Result<()>;
    /// Drop attempts at or before `cutoff_ms`. Returns how many were removed.
    fn prune(&self, capsule: &CapsuleId, cutoff_ms: u64) -> Result<usize>;
    fn clear(&self, capsule: &CapsuleId) -> Result<()>;
}

fn prune_entries(
    entries: &mut HashMap<CapsuleId, Vec<PasswordAttempt>>,
    capsule: &CapsuleId,
    cutoff_ms: u64,
) -> usize {
    let Some(attempts) = entries.get_mut(capsule) else {
        return 0;
    };
    let before = attempts.len();
    attempts.retain(|a| a.timestamp_ms > cutoff_ms);
    let removed = before - attempts.len();
    if attempts.is_empty() {
        entries.remove(capsule);
    }
    removed
}

/// Session-scoped in-memory store
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    entries: Mutex<HashMap<CapsuleId, Vec<PasswordAttempt>>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn get(&self, capsule: &CapsuleId) -> Result<Vec<PasswordAttempt>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(capsule).cloned().unwrap_or_default())
    }

    fn append(&self, capsule: &CapsuleId, attempt: PasswordAttempt) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(capsule.clone()).or_default().push(attempt);
        Ok(())
    }

    fn prune(&self, capsule: &CapsuleId, cutoff_ms: u64) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(prune_entries(&mut entries, capsule, cutoff_ms))
    }

    fn clear(&self, capsule: &CapsuleId) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(capsule);
        Ok(())
    }
}

/// Attempt history persisted to a JSON file
#[derive(Debug)]
pub struct JsonAttemptStore {
    path: PathBuf,
    entries: Mutex<HashMap<CapsuleId, Vec<PasswordAttempt>>>,
}

impl JsonAttemptStore {
    /// Load or create a store at the given path.
    /// If the file doesn't exist, starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading attempt store: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing attempt store: {}", path.display()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<CapsuleId, Vec<PasswordAttempt>>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating attempt store dir: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(entries).context("serializing attempt store")?;

        // Atomic write: write to temp file, then rename
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &json)
            .with_context(|| format!("writing attempt store temp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming attempt store: {}", self.path.display()))?;
        Ok(())
    }
}

impl AttemptStore for JsonAttemptStore {
    fn get(&self, capsule: &CapsuleId) -> Result<Vec<PasswordAttempt>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(capsule).cloned().unwrap_or_default())
    }

    fn append(&self, capsule: &CapsuleId, attempt: PasswordAttempt) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(capsule.clone()).or_default().push(attempt);
        self.flush(&entries)
    }

    fn prune(&self, capsule: &CapsuleId, cutoff_ms: u64) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let removed = prune_entries(&mut entries, capsule, cutoff_ms);
        if removed > 0 {
            self.flush(&entries)?;
        }
        Ok(removed)
    }

    fn clear(&self, capsule: &CapsuleId) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(capsule).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_isolates_capsules() {
        let store = MemoryAttemptStore::new();
        let a = CapsuleId::from("a");
        let b = CapsuleId::from("b");

        store.append(&a, PasswordAttempt::failure(1)).unwrap();
        store.append(&a, PasswordAttempt::failure(2)).unwrap();
        store.append(&b, PasswordAttempt::failure(3)).unwrap();

        assert_eq!(store.get(&a).unwrap().len(), 2);
        assert_eq!(store.get(&b).unwrap(), vec![PasswordAttempt::failure(3)]);

        store.clear(&a).unwrap();
        assert!(store.get(&a).unwrap().is_empty());
        assert_eq!(store.get(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_json_store_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/attempts.json");
        let id = CapsuleId::from("capsule-1");

        {
            let store = JsonAttemptStore::open(&path).unwrap();
            store.append(&id, PasswordAttempt::failure(1000)).unwrap();
            store.append(&id, PasswordAttempt::failure(2000)).unwrap();
        }

        let reopened = JsonAttemptStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(&id).unwrap(),
            vec![PasswordAttempt::failure(1000), PasswordAttempt::failure(2000)]
        );
        assert!(!path.with_extension("tmp").exists());

        reopened.clear(&id).unwrap();
        let reopened = JsonAttemptStore::open(&path).unwrap();
        assert!(reopened.get(&id).unwrap().is_empty());
    }

    #[test]
    fn test_prune_drops_only_old_attempts() {
        let store = MemoryAttemptStore::new();
        let id = CapsuleId::from("a");
        for t in [100, 200, 300] {
            store.append(&id, PasswordAttempt::failure(t)).unwrap();
        }

        assert_eq!(store.prune(&id, 200).unwrap(), 2);
        assert_eq!(store.get(&id).unwrap(), vec![PasswordAttempt::failure(300)]);
        assert_eq!(store.prune(&CapsuleId::from("missing"), 200).unwrap(), 0);
    }

    #[test]
    fn test_json_store_prune_is_persisted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("attempts.json");
        let id = CapsuleId::from("capsule-1");

        let store = JsonAttemptStore::open(&path).unwrap();
        store.append(&id, PasswordAttempt::failure(1000)).unwrap();
        store.append(&id, PasswordAttempt::failure(2000)).unwrap();
        assert_eq!(store.prune(&id, 1500).unwrap(), 1);

        let reopened = JsonAttemptStore::open(&path).unwrap();
        assert_eq!(reopened.get(&id).unwrap(), vec![PasswordAttempt::failure(2000)]);
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("attempts.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(JsonAttemptStore::open(&path).is_err());
    }
}
