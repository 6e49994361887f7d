// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A hierarchical, `thiserror`-derived error system for the storage domain.
//! Every fallible operation in this crate and its adapters returns
//! `Result<T, StorageError>` so the taxonomy stays in one place.
//!
//! ## Error Categories
//!
//! - **Key validation**: [`StorageError::InvalidKey`]
//! - **Lifecycle**: [`StorageError::Initialization`]
//! - **Persistence**: [`StorageError::Database`]
//! - **Serialization**: [`StorageError::Serialization`]
//! - **Compression**: [`StorageError::CompressionFailed`],
//!   [`StorageError::DecompressionFailed`], [`StorageError::UnsupportedAlgorithm`],
//!   [`StorageError::DataCorruption`]
//! - **Encryption**: [`StorageError::InvalidAlgorithm`], [`StorageError::EncryptionFailed`],
//!   [`StorageError::DecryptionFailed`], [`StorageError::KeyDerivationFailed`],
//!   [`StorageError::AuthenticationFailed`], [`StorageError::VaultError`]
//! - **Migrations**: [`StorageError::MigrationError`]
//! - **Quota / access**: [`StorageError::QuotaExceeded`], [`StorageError::PermissionDenied`]

use thiserror::Error;

/// Domain-specific errors for the storage engine.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Vault error: {0}")]
    VaultError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl StorageError {
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn migration_error(msg: impl Into<String>) -> Self {
        Self::MigrationError(msg.into())
    }

    pub fn vault_error(msg: impl Into<String>) -> Self {
        Self::VaultError(msg.into())
    }

    /// Whether a retry of the same operation might succeed without caller
    /// intervention (transient I/O / lock contention), as opposed to a
    /// structural failure that will recur until the caller changes something.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StorageError::Database(_) | StorageError::QuotaExceeded(_))
    }

    /// Broad category used for metrics and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            StorageError::InvalidKey(_) => "key",
            StorageError::Initialization(_) => "lifecycle",
            StorageError::Database(_) => "database",
            StorageError::Serialization(_) => "serialization",
            StorageError::CompressionFailed(_)
            | StorageError::DecompressionFailed(_)
            | StorageError::UnsupportedAlgorithm(_)
            | StorageError::DataCorruption(_) => "compression",
            StorageError::InvalidAlgorithm(_)
            | StorageError::EncryptionFailed(_)
            | StorageError::DecryptionFailed(_)
            | StorageError::KeyDerivationFailed(_)
            | StorageError::AuthenticationFailed(_) => "encryption",
            StorageError::VaultError(_) => "vault",
            StorageError::MigrationError(_) => "migration",
            StorageError::QuotaExceeded(_) | StorageError::PermissionDenied(_) => "access",
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
