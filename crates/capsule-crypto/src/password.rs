//! Password generation and strength scoring

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Uppercase, lowercase, digits, then symbols: 70 characters.
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

pub const DEFAULT_PASSWORD_LENGTH: usize = 20;

/// Scores at or above this are reported as strong.
pub const STRONG_SCORE: u8 = 6;

pub const MAX_SCORE: u8 = 8;

/// Result of [`check_password_strength`]. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    /// 0..=8
    pub score: u8,
    /// Human-readable deficiencies, empty for a perfect score
    pub feedback: Vec<String>,
    pub is_strong: bool,
}

/// Generate a password of `length` characters from [`PASSWORD_ALPHABET`].
///
/// Bytes come from the OS CSPRNG. Bytes that would bias the modulo mapping
/// are redrawn. Passwords of four or more characters are redrawn until they
/// contain every character class.
pub fn generate_secure_password(length: usize) -> SecretString {
    loop {
        let candidate = random_from_alphabet(length);
        if length < 4 || classes(&candidate).all() {
            return SecretString::from(candidate);
        }
    }
}

fn random_from_alphabet(length: usize) -> String {
    let alphabet_len = PASSWORD_ALPHABET.len();
    // Largest multiple of the alphabet size that fits in a byte
    let limit = 256 - (256 % alphabet_len);

    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 64];
    while out.len() < length {
        OsRng.fill_bytes(&mut buf);
        for &byte in buf.iter() {
            if out.len() == length {
                break;
            }
            if (byte as usize) < limit {
                out.push(PASSWORD_ALPHABET[byte as usize % alphabet_len] as char);
            }
        }
    }
    buf.fill(0);
    out
}

#[derive(Debug, Default, Clone, Copy)]
struct CharClasses {
    lower: bool,
    upper: bool,
    digit: bool,
    symbol: bool,
}

impl CharClasses {
    fn all(&self) -> bool {
        self.lower && self.upper && self.digit && self.symbol
    }
}

fn classes(password: &str) -> CharClasses {
    let mut found = CharClasses::default();
    for c in password.chars() {
        if c.is_lowercase() {
            found.lower = true;
        } else if c.is_uppercase() {
            found.upper = true;
        } else if c.is_ascii_digit() {
            found.digit = true;
        } else if !c.is_alphanumeric() {
            found.symbol = true;
        }
    }
    found
}

/// Score a password against a fixed rubric.
///
/// - length ≥ 12: +2 (≥ 8: +1)
/// - lowercase, uppercase, digit: +1 each
/// - any non-alphanumeric symbol: +2
/// - length ≥ 16: +1
/// - all four classes present: +1
///
/// The raw total can reach 9; the score is capped at 8.
pub fn check_password_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let found = classes(password);
    let mut score: u8 = 0;
    let mut feedback = Vec::new();

    if length >= 12 {
        score += 2;
    } else if length >= 8 {
        score += 1;
        feedback.push("Use at least 12 characters for better security".to_string());
    } else {
        feedback.push("Password is too short (minimum 8 characters)".to_string());
    }

    if found.lower {
        score += 1;
    } else {
        feedback.push("Add lowercase letters".to_string());
    }
    if found.upper {
        score += 1;
    } else {
        feedback.push("Add uppercase letters".to_string());
    }
    if found.digit {
        score += 1;
    } else {
        feedback.push("Add numbers".to_string());
    }
    if found.symbol {
        score += 2;
    } else {
        feedback.push("Add special characters (!@#$%^&*)".to_string());
    }

    if length >= 16 {
        score += 1;
    }
    if found.all() {
        score += 1;
    }

    let score = score.min(MAX_SCORE);
    PasswordStrength {
        score,
        feedback,
        is_strong: score >= STRONG_SCORE,
    }
}
