// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! ## Exit Code Conventions
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **128+N**: Fatal signal N (e.g., 130 = SIGINT)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strongbox_bootstrap::exit_code::{result_to_exit_code, ExitCode};
//! use strongbox_domain::error::StorageError;
//!
//! fn run() -> Result<(), StorageError> {
//!     Ok(())
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     result_to_exit_code(run())
//! }
//! ```

use std::fmt;

use strongbox_domain::error::StorageError;

/// Exit codes following Unix conventions (BSD sysexits.h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65) — malformed values, serialization failures
    DataError = 65,

    /// Cannot open input (66) — missing key, missing config file
    NoInput = 66,

    /// Service unavailable (69) — adapter not initialized, quota exceeded
    Unavailable = 69,

    /// Internal software error (70) — migration or vault inconsistency
    Software = 70,

    /// I/O error (74) — database/backing-store I/O failure
    IoError = 74,

    /// Permission denied (77)
    NoPerm = 77,

    /// Configuration error (78) — bad `strongbox.toml`, bad passphrase
    Config = 78,

    /// Interrupted by signal (SIGINT - Ctrl+C) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a [`StorageError`] to the exit code a CLI invocation should
    /// terminate with.
    pub fn from_storage_error(error: &StorageError) -> Self {
        match error {
            StorageError::InvalidKey(_) => ExitCode::UsageError,
            StorageError::Initialization(_) => ExitCode::Config,
            StorageError::Database(_) => ExitCode::IoError,
            StorageError::Serialization(_) => ExitCode::DataError,
            StorageError::CompressionFailed(_)
            | StorageError::DecompressionFailed(_)
            | StorageError::UnsupportedAlgorithm(_)
            | StorageError::DataCorruption(_) => ExitCode::DataError,
            StorageError::InvalidAlgorithm(_)
            | StorageError::EncryptionFailed(_)
            | StorageError::DecryptionFailed(_)
            | StorageError::KeyDerivationFailed(_)
            | StorageError::AuthenticationFailed(_) => ExitCode::Software,
            StorageError::VaultError(_) => ExitCode::Software,
            StorageError::MigrationError(_) => ExitCode::Software,
            StorageError::QuotaExceeded(_) => ExitCode::Unavailable,
            StorageError::PermissionDenied(_) => ExitCode::NoPerm,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Map a storage error to a process exit code, logging it at `error` level
/// first so the cause is visible even when the process is run non-interactively.
pub fn map_error_to_exit_code(error: &StorageError) -> ExitCode {
    tracing::error!(category = error.category(), "{error}");
    ExitCode::from_storage_error(error)
}

/// Convert a `Result` into a `std::process::ExitCode`, the shape `main()`
/// returns from.
pub fn result_to_exit_code<T>(result: Result<T, StorageError>) -> std::process::ExitCode {
    match result {
        Ok(_) => ExitCode::Success.into(),
        Err(e) => map_error_to_exit_code(&e).into(),
    }
}
