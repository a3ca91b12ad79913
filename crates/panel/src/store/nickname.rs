// Nickname validation and storage.

use std::collections::HashMap;

use thiserror::Error;

/// Maximum nickname length in characters, after trimming.
pub const NICKNAME_MAX_CHARS: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NicknameError {
    #[error("token required")]
    TokenRequired,

    #[error("nickname required (1-{NICKNAME_MAX_CHARS} chars)")]
    Empty,

    #[error("nickname must be at most {max} chars")]
    TooLong { max: usize },

    #[error("could not resolve identity from token")]
    UnknownIdentity,
}

/// Trim and validate a nickname.
pub fn validate_nickname(raw: &str) -> Result<String, NicknameError> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(NicknameError::Empty);
    }
    if nickname.chars().count() > NICKNAME_MAX_CHARS {
        return Err(NicknameError::TooLong { max: NICKNAME_MAX_CHARS });
    }
    Ok(nickname.to_string())
}

/// Saved nicknames keyed by subject id.
#[derive(Debug, Clone, Default)]
pub struct NicknameBook {
    by_subject: HashMap<String, String>,
}

impl NicknameBook {
    pub fn get(&self, subject_id: &str) -> Option<&str> {
        self.by_subject.get(subject_id).map(String::as_str)
    }

    pub fn set(&mut self, subject_id: &str, nickname: String) {
        self.by_subject.insert(subject_id.to_string(), nickname);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_is_trimmed() {
        assert_eq!(validate_nickname("  Ana  ").unwrap(), "Ana");
    }

    #[test]
    fn blank_nickname_is_rejected() {
        assert_eq!(validate_nickname("   "), Err(NicknameError::Empty));
    }

    #[test]
    fn length_limit_counts_characters() {
        assert!(validate_nickname(&"é".repeat(64)).is_ok());
        assert_eq!(validate_nickname(&"é".repeat(65)), Err(NicknameError::TooLong { max: 64 }));
    }

    #[test]
    fn book_overwrites() {
        let mut book = NicknameBook::default();
        book.set("sub", "one".into());
        book.set("sub", "two".into());
        assert_eq!(book.get("sub"), Some("two"));
        assert_eq!(book.get("other"), None);
    }
}
