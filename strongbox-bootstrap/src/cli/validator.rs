// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Parsing
//!
//! Security-first argument validation, applied after `clap` has already
//! parsed argument shape. Catches the attacker-controlled-string class of
//! bug that type-level parsing alone doesn't: path traversal, shell
//! metacharacters smuggled into a value that later gets interpolated into a
//! log line or a file path, and oversized input aimed at exhausting memory.
//!
//! ## Dangerous Patterns Detected
//!
//! - `..` - Path traversal
//! - `~` - Home directory expansion
//! - `$` - Variable expansion
//! - Backticks - Command substitution
//! - `;` `&` `|` - Command chaining
//! - `>` `<` - Redirection
//! - Null bytes, newlines, carriage returns

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum single argument length.
const MAX_ARG_LENGTH: usize = 4096;

/// Maximum path length.
const MAX_PATH_LENGTH: usize = 4096;

/// Dangerous patterns that indicate potential attacks.
const DANGEROUS_PATTERNS: &[&str] = &["..", "~", "$", "`", ";", "&", "|", ">", "<", "\n", "\r", "\0"];

/// Protected system directories a `--store-path`/`--file` must never resolve into.
const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

/// Secure argument parsing errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    #[error("dangerous pattern detected in argument: {pattern} in {arg}")]
    DangerousPattern { pattern: String, arg: String },

    #[error("path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,

    #[error("access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Secure argument parser.
pub struct SecureArgParser;

impl SecureArgParser {
    /// Validate a single argument for security issues.
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ParseError::DangerousPattern {
                    pattern: pattern.to_string(),
                    arg: arg.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validate a storage key's surface form before it ever reaches
    /// `StorageKey::new` (which only checks length, not injection patterns).
    pub fn validate_key(key: &str) -> Result<(), ParseError> {
        Self::validate_argument(key).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidKey(format!("key too long: {key}")),
            ParseError::DangerousPattern { pattern, .. } => {
                ParseError::InvalidKey(format!("key contains disallowed character '{pattern}': {key}"))
            }
            other => other,
        })
    }

    /// Validate and canonicalize a file path that must already exist (the
    /// JSON source for `set --file`, a config file).
    pub fn validate_path(path: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(path).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidPath(format!("path too long: {path}")),
            ParseError::DangerousPattern { pattern, .. } => {
                ParseError::InvalidPath(format!("path contains dangerous pattern '{pattern}': {path}"))
            }
            other => other,
        })?;

        let path_obj = Path::new(path);
        let canonical = path_obj.canonicalize().map_err(|e| {
            if !path_obj.exists() {
                ParseError::PathNotFound(path.to_string())
            } else {
                ParseError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ParseError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ParseError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Validate an optional path (may be `None`).
    pub fn validate_optional_path(path: Option<&str>) -> Result<Option<PathBuf>, ParseError> {
        match path {
            Some(p) => Self::validate_path(p).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_storage_keys() {
        assert!(SecureArgParser::validate_key("users:1").is_ok());
        assert!(SecureArgParser::validate_key("users:1:profile").is_ok());
    }

    #[test]
    fn rejects_too_long_arguments() {
        let long_arg = "a".repeat(MAX_ARG_LENGTH + 1);
        assert!(matches!(
            SecureArgParser::validate_argument(&long_arg),
            Err(ParseError::ArgumentTooLong(_))
        ));
    }

    #[test]
    fn detects_dangerous_patterns() {
        let dangerous = [
            "../etc/passwd",
            "~/.ssh/id_rsa",
            "$(whoami)",
            "`ls`",
            "key;rm -rf /",
            "key&background",
            "key|pipe",
            "key>output",
            "key<input",
            "key\nwith\nnewlines",
        ];

        for arg in dangerous {
            assert!(
                matches!(SecureArgParser::validate_argument(arg), Err(ParseError::DangerousPattern { .. })),
                "failed to detect dangerous pattern in: {arg}"
            );
        }
    }

    #[test]
    fn validate_key_reports_invalid_key_variant() {
        assert!(matches!(SecureArgParser::validate_key("../x"), Err(ParseError::InvalidKey(_))));
    }

    #[test]
    fn validate_optional_path_passes_through_none() {
        assert!(SecureArgParser::validate_optional_path(None).unwrap().is_none());
    }
}
