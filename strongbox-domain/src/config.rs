// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Configuration tree for the storage engine, modeled on the observability
//! configuration shape this domain was forked from: one top-level struct
//! with a `Default` impl per section, deserialised from TOML at the
//! bootstrap layer.

use crate::encrypted_data::EncryptionAlgorithm;
use crate::metadata::CompressionAlgorithm;
use serde::{Deserialize, Serialize};

/// Which concrete adapter backs a `StorageManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Memory,
    Sqlite,
    Dexie,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: AdapterKind,
    pub path: Option<String>,
    pub name: String,
    pub encryption: EncryptionConfig,
    pub compression: CompressionConfig,
    pub cache: CacheConfig,
    pub migrations: MigrationsConfig,
    pub vault: Option<VaultConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: AdapterKind::Memory,
            path: None,
            name: "strongbox".to_string(),
            encryption: EncryptionConfig::default(),
            compression: CompressionConfig::default(),
            cache: CacheConfig::default(),
            migrations: MigrationsConfig::default(),
            vault: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub passphrase: Option<String>,
    pub algorithm: EncryptionAlgorithm,
    pub encrypted_fields: Option<Vec<String>>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            passphrase: None,
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            encrypted_fields: None,
        }
    }
}

/// How the "auto"/algorithm-selection compression decision is made; see the
/// compression service for the decide-and-compress policy this config
/// parameterises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithmChoice {
    Auto,
    Gzip,
    Deflate,
    Lz4,
    Brotli,
    None,
}

impl CompressionAlgorithmChoice {
    pub fn resolve(self, data_len: usize) -> CompressionAlgorithm {
        match self {
            CompressionAlgorithmChoice::Auto => {
                if data_len < 10 * 1024 {
                    CompressionAlgorithm::Lz4
                } else {
                    CompressionAlgorithm::Brotli
                }
            }
            CompressionAlgorithmChoice::Gzip => CompressionAlgorithm::Gzip,
            CompressionAlgorithmChoice::Deflate => CompressionAlgorithm::Deflate,
            CompressionAlgorithmChoice::Lz4 => CompressionAlgorithm::Lz4,
            CompressionAlgorithmChoice::Brotli => CompressionAlgorithm::Brotli,
            CompressionAlgorithmChoice::None => CompressionAlgorithm::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub algorithm: CompressionAlgorithmChoice,
    pub min_size: u64,
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: CompressionAlgorithmChoice::Auto,
            min_size: 1024,
            level: 6,
        }
    }
}

impl CompressionConfig {
    /// Clamp `level` into the valid SQL/CLI-free range used across this
    /// codebase's compression providers (the per-algorithm bound check
    /// still happens in the compression service).
    pub fn clamped_level(&self) -> i32 {
        self.level.clamp(-1, 9)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_items: usize,
    pub max_size_bytes: u64,
    pub ttl_ms: i64,
    pub enable_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: 1000,
            max_size_bytes: 100 * 1024 * 1024,
            ttl_ms: 300_000,
            enable_stats: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    pub auto_migrate: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self { auto_migrate: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub passphrase: String,
    pub namespace: String,
    pub algorithm: EncryptionAlgorithm,
    pub key_rotation_interval_ms: i64,
    pub max_access_log_size: usize,
    pub audit_enabled: bool,
    pub auto_rotate_keys: bool,
}

impl VaultConfig {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
            namespace: "vault".to_string(),
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            key_rotation_interval_ms: 30 * 24 * 60 * 60 * 1000,
            max_access_log_size: 1000,
            audit_enabled: true,
            auto_rotate_keys: false,
        }
    }
}
