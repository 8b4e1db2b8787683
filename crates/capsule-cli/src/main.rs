//! capsule: password-protected capsules from the command line
//!
//! Commands:
//!   genpass [--length N]              - generate a password and show its score
//!   strength                          - score a password typed at the prompt
//!   encrypt-text --out <envelope>     - encrypt stdin (or --input FILE) into a JSON envelope
//!   decrypt-text <envelope>           - print the decrypted text
//!   encrypt-file <input> --out <blob> - write <blob> and <blob>.envelope.json
//!   decrypt-file <blob> [--out PATH]  - restore the original file
//!   unlock <envelope> --capsule-id ID - unlock with persistent attempt lockout
//!   config show                       - display current configuration
//!
//! Passwords are taken from CAPSULE_PASSWORD when set, otherwise prompted for
//! on the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use capsule_core::config::{expand_home, load_config, CapsuleConfig};
use capsule_core::CapsuleId;
use capsule_crypto::password::MAX_SCORE;
use capsule_crypto::{
    check_password_strength, generate_secure_password, CapsuleContent, CapsuleCrypto,
    CryptoError, CryptoParams, EncryptedFile, EncryptionEnvelope, FileEncryptionEnvelope,
    FileProgress, KdfParams, PasswordStrength, PlainFile,
};
use capsule_lock::{CapsuleLock, JsonAttemptStore, LockError, LockoutPolicy};

const PASSWORD_ENV: &str = "CAPSULE_PASSWORD";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "capsule",
    version,
    about = "Password-protected capsule encryption",
    long_about = "capsule: encrypt text and files under a password, generate and score \
                  passwords, and unlock protected capsules with attempt lockout"
)]
struct Cli {
    /// Path to capsule.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "CAPSULE_CONFIG",
        default_value = "~/.config/capsule/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overrides [logging] log_level
    #[arg(long, env = "CAPSULE_LOG")]
    log: Option<String>,

    /// Log format (json, text), overrides [logging] log_format
    #[arg(long, env = "CAPSULE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random password
    Genpass {
        /// Number of characters (default: [crypto] password_length)
        #[arg(long, short = 'l')]
        length: Option<usize>,
    },

    /// Score a password typed at the prompt
    Strength,

    /// Encrypt text into a JSON envelope
    #[command(name = "encrypt-text")]
    EncryptText {
        /// Read the text from this file instead of stdin
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Where to write the envelope
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Decrypt a JSON envelope and print the text
    #[command(name = "decrypt-text")]
    DecryptText {
        envelope: PathBuf,
    },

    /// Encrypt a file in chunks
    ///
    /// Writes the encrypted blob to OUT and its envelope to OUT.envelope.json.
    #[command(name = "encrypt-file")]
    EncryptFile {
        input: PathBuf,
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// MIME type to record (default: guessed from the extension)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Decrypt a blob written by encrypt-file
    #[command(name = "decrypt-file")]
    DecryptFile {
        /// Encrypted blob; BLOB.envelope.json must sit next to it
        blob: PathBuf,
        /// Output path (default: original file name in the current directory)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Unlock a protected capsule, counting failed attempts across runs
    Unlock {
        envelope: PathBuf,
        #[arg(long)]
        capsule_id: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_home(&cli.config);
    let config = load_config(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.as_deref().unwrap_or(&config.logging.log_level);
    init_logging(level, resolve_log_format(cli.log_format, &config)?);
    debug!(config = %config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Genpass { length } => {
            cmd_genpass(length.unwrap_or(config.crypto.password_length))
        }
        Commands::Strength => cmd_strength(),
        Commands::EncryptText { input, out } => {
            cmd_encrypt_text(&config, input.as_deref(), &out).await
        }
        Commands::DecryptText { envelope } => cmd_decrypt_text(&config, &envelope).await,
        Commands::EncryptFile { input, out, mime } => {
            cmd_encrypt_file(&config, &input, &out, mime.as_deref()).await
        }
        Commands::DecryptFile { blob, out } => {
            cmd_decrypt_file(&config, &blob, out.as_deref()).await
        }
        Commands::Unlock {
            envelope,
            capsule_id,
        } => cmd_unlock(&config, &envelope, &capsule_id).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

/// Logs go to stderr; stdout carries decrypted output.
fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn resolve_log_format(flag: Option<LogFormat>, config: &CapsuleConfig) -> Result<LogFormat> {
    match flag {
        Some(format) => Ok(format),
        None => <LogFormat as ValueEnum>::from_str(&config.logging.log_format, true)
            .map_err(|e| anyhow::anyhow!("logging.log_format: {e}")),
    }
}

fn build_crypto(config: &CapsuleConfig) -> Result<CapsuleCrypto> {
    CapsuleCrypto::new(CryptoParams {
        kdf: KdfParams {
            iterations: config.crypto.pbkdf2_iterations,
        },
        chunk_size: config.crypto.chunk_size_bytes,
    })
    .context("building crypto service")
}

// ── Password input ────────────────────────────────────────────────────────────

/// Read a password from CAPSULE_PASSWORD or the terminal.
///
/// `confirm` asks twice on the terminal; the environment variable is trusted
/// as given.
fn read_password(prompt: &str, confirm: bool) -> Result<SecretString> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(value) => {
            debug!("using password from {PASSWORD_ENV}");
            Zeroizing::new(value)
        }
        Err(_) => {
            let first =
                Zeroizing::new(rpassword::prompt_password(prompt).context("reading password")?);
            if confirm {
                let second = Zeroizing::new(
                    rpassword::prompt_password("Confirm password: ")
                        .context("reading password")?,
                );
                if *first != *second {
                    anyhow::bail!("passwords do not match");
                }
            }
            first
        }
    };

    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    Ok(SecretString::from(password.as_str()))
}

/// Map password failures to the single message shown to users.
fn user_facing(err: CryptoError) -> anyhow::Error {
    if err.is_password_failure() {
        anyhow::anyhow!(err.user_message())
    } else {
        err.into()
    }
}

fn print_strength(strength: &PasswordStrength) {
    let verdict = if strength.is_strong { "strong" } else { "weak" };
    eprintln!("strength: {}/{MAX_SCORE} ({verdict})", strength.score);
    for hint in &strength.feedback {
        eprintln!("  - {hint}");
    }
}

fn warn_if_weak(password: &SecretString) {
    let strength = check_password_strength(password.expose_secret());
    if !strength.is_strong {
        eprintln!("warning: this password is weak");
        print_strength(&strength);
    }
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("progress bar template")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Drive `pb` from chunk progress until the sender side is dropped.
fn track_progress(
    pb: ProgressBar,
    mut rx: mpsc::UnboundedReceiver<FileProgress>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
        }
    })
}

// ── `capsule genpass` / `capsule strength` ───────────────────────────────────

fn cmd_genpass(length: usize) -> Result<()> {
    if length == 0 {
        anyhow::bail!("password length must be at least 1");
    }
    let password = generate_secure_password(length);
    println!("{}", password.expose_secret());
    print_strength(&check_password_strength(password.expose_secret()));
    Ok(())
}

fn cmd_strength() -> Result<()> {
    let password = read_password("Password to check: ", false)?;
    print_strength(&check_password_strength(password.expose_secret()));
    Ok(())
}

// ── `capsule encrypt-text` / `capsule decrypt-text` ───────────────────────────

async fn cmd_encrypt_text(config: &CapsuleConfig, input: Option<&Path>, out: &Path) -> Result<()> {
    let text = Zeroizing::new(match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    });
    let len = text.len();

    let password = read_password("New password: ", true)?;
    warn_if_weak(&password);

    let crypto = build_crypto(config)?;
    let envelope = crypto.encrypt_text_async(text, password).await?;
    tokio::fs::write(out, envelope.to_json()?)
        .await
        .with_context(|| format!("writing envelope: {}", out.display()))?;

    info!(path = %out.display(), "text envelope written");
    println!("Encrypted {} → {}", fmt_bytes(len as u64), out.display());
    Ok(())
}

async fn read_envelope(path: &Path) -> Result<EncryptionEnvelope> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading envelope: {}", path.display()))?;
    EncryptionEnvelope::from_json(&json)
        .with_context(|| format!("parsing envelope: {}", path.display()))
}

async fn cmd_decrypt_text(config: &CapsuleConfig, envelope_path: &Path) -> Result<()> {
    let envelope = read_envelope(envelope_path).await?;
    let password = read_password("Password: ", false)?;

    let crypto = build_crypto(config)?;
    let text = Zeroizing::new(
        crypto
            .decrypt_text_async(envelope, password)
            .await
            .map_err(user_facing)?,
    );
    print!("{}", text.as_str());
    Ok(())
}

// ── `capsule encrypt-file` / `capsule decrypt-file` ───────────────────────────

/// `photo.bin` → `photo.bin.envelope.json`
fn envelope_path_for(blob: &Path) -> PathBuf {
    let mut name = blob.file_name().map(OsString::from).unwrap_or_default();
    name.push(".envelope.json");
    blob.with_file_name(name)
}

/// Output path for a decrypted file: the stored name without any directory
/// components.
fn restore_path(original_name: &str) -> PathBuf {
    Path::new(original_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("decrypted.bin"))
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

async fn write_encrypted(out: &Path, encrypted: &EncryptedFile) -> Result<PathBuf> {
    let envelope_path = envelope_path_for(out);
    tokio::fs::write(out, &encrypted.blob)
        .await
        .with_context(|| format!("writing blob: {}", out.display()))?;
    tokio::fs::write(&envelope_path, encrypted.envelope.to_json()?)
        .await
        .with_context(|| format!("writing envelope: {}", envelope_path.display()))?;
    Ok(envelope_path)
}

async fn read_encrypted(blob_path: &Path) -> Result<(Vec<u8>, FileEncryptionEnvelope)> {
    let envelope_path = envelope_path_for(blob_path);
    let json = tokio::fs::read_to_string(&envelope_path)
        .await
        .with_context(|| format!("reading envelope: {}", envelope_path.display()))?;
    let envelope = FileEncryptionEnvelope::from_json(&json)
        .with_context(|| format!("parsing envelope: {}", envelope_path.display()))?;
    let blob = tokio::fs::read(blob_path)
        .await
        .with_context(|| format!("reading blob: {}", blob_path.display()))?;
    Ok((blob, envelope))
}

async fn cmd_encrypt_file(
    config: &CapsuleConfig,
    input: &Path,
    out: &Path,
    mime: Option<&str>,
) -> Result<()> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let mime = mime.unwrap_or_else(|| guess_mime(input));
    let file = PlainFile::new(name, mime, data);
    let size = file.data.len() as u64;

    let password = read_password("New password: ", true)?;
    warn_if_weak(&password);
    let crypto = build_crypto(config)?;

    let pb = make_progress_bar("encrypt")?;
    pb.set_message(input.display().to_string());
    let (tx, rx) = mpsc::unbounded_channel();
    let ticker = track_progress(pb.clone(), rx);

    let result = crypto.encrypt_file_async(file, password, Some(tx)).await;
    ticker.await.context("progress task")?;
    let encrypted = result?;
    pb.finish_with_message("done".to_string());

    let envelope_path = write_encrypted(out, &encrypted).await?;
    info!(blob = %out.display(), envelope = %envelope_path.display(), "file encrypted");

    println!("Encrypted {} ({})", input.display(), fmt_bytes(size));
    println!("  blob:     {}", out.display());
    println!("  envelope: {}", envelope_path.display());
    println!("  chunks:   {}", pb.length().unwrap_or_default());
    Ok(())
}

async fn cmd_decrypt_file(config: &CapsuleConfig, blob_path: &Path, out: Option<&Path>) -> Result<()> {
    let (blob, envelope) = read_encrypted(blob_path).await?;
    let password = read_password("Password: ", false)?;
    let crypto = build_crypto(config)?;

    let pb = make_progress_bar("decrypt")?;
    pb.set_message(blob_path.display().to_string());
    let (tx, rx) = mpsc::unbounded_channel();
    let ticker = track_progress(pb.clone(), rx);

    let result = crypto
        .decrypt_file_async(blob, envelope, password, Some(tx))
        .await;
    ticker.await.context("progress task")?;
    let file = match result {
        Ok(file) => file,
        Err(e) => {
            pb.abandon();
            return Err(user_facing(e));
        }
    };
    pb.finish_with_message("done".to_string());

    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| restore_path(&file.name));
    tokio::fs::write(&out, &file.data)
        .await
        .with_context(|| format!("writing {}", out.display()))?;

    println!(
        "Decrypted {} ({}, {}) → {}",
        file.name,
        file.mime_type,
        fmt_bytes(file.data.len() as u64),
        out.display()
    );
    Ok(())
}

// ── `capsule unlock` ──────────────────────────────────────────────────────────

async fn cmd_unlock(config: &CapsuleConfig, envelope_path: &Path, capsule_id: &str) -> Result<()> {
    let envelope = read_envelope(envelope_path).await?;

    let store_path = expand_home(&config.session.attempt_store);
    let store = JsonAttemptStore::open(&store_path)
        .with_context(|| format!("opening attempt store: {}", store_path.display()))?;
    let crypto = build_crypto(config)?;

    let mut lock = CapsuleLock::new(
        CapsuleId::from(capsule_id),
        CapsuleContent::Encrypted(envelope),
        crypto,
        Arc::new(store),
    )
    .with_policy(LockoutPolicy::from(&config.lockout));

    // Refuse before prompting if a lockout is already running
    if let Some(remaining) = lock.lockout_remaining()? {
        anyhow::bail!("{}", LockError::LockedOut { remaining }.user_message());
    }

    let password = read_password("Password: ", false)?;
    match lock.unlock(password).await {
        Ok(()) => {
            if let Some(text) = lock.plaintext() {
                println!("{text}");
            }
            Ok(())
        }
        Err(e @ (LockError::InvalidPassword { .. } | LockError::LockedOut { .. })) => {
            anyhow::bail!("{}", e.user_message())
        }
        Err(e) => Err(e.into()),
    }
}

// ── `capsule config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &CapsuleConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encrypt_file() {
        let cli = Cli::try_parse_from([
            "capsule",
            "encrypt-file",
            "scan.pdf",
            "--out",
            "scan.bin",
            "--mime",
            "application/pdf",
        ])
        .unwrap();
        match cli.command {
            Commands::EncryptFile { input, out, mime } => {
                assert_eq!(input, PathBuf::from("scan.pdf"));
                assert_eq!(out, PathBuf::from("scan.bin"));
                assert_eq!(mime.as_deref(), Some("application/pdf"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_envelope_path_for() {
        assert_eq!(
            envelope_path_for(Path::new("out/photo.bin")),
            PathBuf::from("out/photo.bin.envelope.json")
        );
    }

    #[test]
    fn test_restore_path_strips_directories() {
        assert_eq!(restore_path("report.pdf"), PathBuf::from("report.pdf"));
        assert_eq!(restore_path("../../etc/passwd"), PathBuf::from("passwd"));
        assert_eq!(restore_path(".."), PathBuf::from("decrypted.bin"));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a/Notes.TXT")), "text/plain");
        assert_eq!(guess_mime(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_resolve_log_format() {
        let mut config = CapsuleConfig::default();
        assert_eq!(resolve_log_format(None, &config).unwrap(), LogFormat::Text);

        config.logging.log_format = "JSON".into();
        assert_eq!(resolve_log_format(None, &config).unwrap(), LogFormat::Json);
        assert_eq!(
            resolve_log_format(Some(LogFormat::Text), &config).unwrap(),
            LogFormat::Text
        );

        config.logging.log_format = "xml".into();
        assert!(resolve_log_format(None, &config).is_err());
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(1536), "1.5 KB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_encrypted_file_on_disk_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let crypto = CapsuleCrypto::new(CryptoParams {
            kdf: KdfParams { iterations: 1_000 },
            chunk_size: 64,
        })
        .unwrap();
        let file = PlainFile::new("notes.txt", "text/plain", vec![42u8; 200]);
        let encrypted = crypto
            .encrypt_file(&file, &SecretString::from("pw"), |_| {})
            .unwrap();

        let out = tmp.path().join("notes.bin");
        let envelope_path = write_encrypted(&out, &encrypted).await.unwrap();
        assert_eq!(envelope_path, tmp.path().join("notes.bin.envelope.json"));

        let (blob, envelope) = read_encrypted(&out).await.unwrap();
        let decrypted = crypto
            .decrypt_file(&blob, &envelope, &SecretString::from("pw"), |_| {})
            .unwrap();
        assert_eq!(decrypted, file);
    }

    #[tokio::test]
    async fn test_read_encrypted_requires_envelope() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blob = tmp.path().join("orphan.bin");
        std::fs::write(&blob, b"data").unwrap();

        let err = read_encrypted(&blob).await.unwrap_err();
        assert!(err.to_string().contains("orphan.bin.envelope.json"));
    }

    #[tokio::test]
    async fn test_unlock_refuses_before_prompt_during_lockout() {
        use capsule_lock::{AttemptStore, PasswordAttempt};

        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = CapsuleConfig::default();
        config.session.attempt_store = tmp.path().join("attempts.json");

        let crypto = CapsuleCrypto::new(CryptoParams {
            kdf: KdfParams { iterations: 1_000 },
            ..CryptoParams::default()
        })
        .unwrap();
        let envelope = crypto
            .encrypt_text("dear diary", &SecretString::from("pw"))
            .unwrap();
        let envelope_path = tmp.path().join("diary.json");
        std::fs::write(&envelope_path, envelope.to_json().unwrap()).unwrap();

        let store = JsonAttemptStore::open(&config.session.attempt_store).unwrap();
        let now_ms = capsule_lock::clock::to_millis(std::time::SystemTime::now());
        for _ in 0..5 {
            store
                .append(&CapsuleId::from("diary"), PasswordAttempt::failure(now_ms))
                .unwrap();
        }

        let err = cmd_unlock(&config, &envelope_path, "diary")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Too many failed attempts"), "{err}");
    }

    #[test]
    fn test_password_failures_share_one_message() {
        assert_eq!(user_facing(CryptoError::Decryption).to_string(), "Invalid password.");
        assert_eq!(
            user_facing(CryptoError::InvalidPassword).to_string(),
            "Invalid password."
        );
    }
}
