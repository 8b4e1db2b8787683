use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CapsuleError, CapsuleResult};

/// Iteration counts below this log a warning at load time.
pub const RECOMMENDED_MIN_ITERATIONS: u32 = 100_000;

/// Top-level configuration (loaded from capsule.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    pub crypto: CryptoConfig,
    pub lockout: LockoutConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Password-based encryption parameters.
///
/// `pbkdf2_iterations` and `chunk_size_bytes` are part of the on-disk format:
/// changing the iteration count makes every existing envelope undecryptable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 iteration count (default: 100000)
    pub pbkdf2_iterations: u32,
    /// File chunk size in bytes, multiple of 16 (default: 1 MiB)
    pub chunk_size_bytes: usize,
    /// Length of generated passwords (default: 20)
    pub password_length: usize,
}

/// Brute-force mitigation for password-protected capsules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failed attempts inside the window that trigger a lockout (default: 5)
    pub max_failures: u32,
    /// Rolling window in which failures are counted, in seconds (default: 1800)
    pub window_secs: u64,
    /// Lockout duration from the last qualifying failure, in seconds (default: 1800)
    pub lockout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding per-capsule attempt history
    pub attempt_store: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: 100_000,
            chunk_size_bytes: 1024 * 1024,
            password_length: 20,
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_secs: 30 * 60,
            lockout_secs: 30 * 60,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            attempt_store: PathBuf::from("~/.local/share/capsule/attempts.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl CapsuleConfig {
    /// Reject values that would make encryption unusable or lockout meaningless.
    pub fn validate(&self) -> CapsuleResult<()> {
        if self.crypto.pbkdf2_iterations == 0 {
            return Err(CapsuleError::Config(
                "crypto.pbkdf2_iterations must be greater than zero".into(),
            ));
        }
        if self.crypto.pbkdf2_iterations < RECOMMENDED_MIN_ITERATIONS {
            tracing::warn!(
                iterations = self.crypto.pbkdf2_iterations,
                recommended = RECOMMENDED_MIN_ITERATIONS,
                "PBKDF2 iteration count below recommended minimum"
            );
        }
        if self.crypto.chunk_size_bytes == 0 || self.crypto.chunk_size_bytes % 16 != 0 {
            return Err(CapsuleError::Config(format!(
                "crypto.chunk_size_bytes must be a non-zero multiple of 16, got {}",
                self.crypto.chunk_size_bytes
            )));
        }
        if self.lockout.max_failures == 0 {
            return Err(CapsuleError::Config(
                "lockout.max_failures must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Load and validate configuration from a TOML file.
///
/// A missing file is not an error: defaults are used and a warning is logged.
pub fn load_config(path: &Path) -> CapsuleResult<CapsuleConfig> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CapsuleError::Config(format!("parsing {}: {e}", path.display())))?
    } else {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
        CapsuleConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Expand a leading `~/` using `$HOME`. Other paths are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
