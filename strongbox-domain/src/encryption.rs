// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encryption Service Contract
//!
//! Domain-level interface for key derivation and authenticated encryption.
//! See the engine crate's `MultiAlgoEncryption` for the concrete Argon2id /
//! AES-256-GCM / ChaCha20-Poly1305 implementation.

use crate::encrypted_data::{EncryptedData, EncryptionAlgorithm, KeyMaterial};
use crate::error::StorageError;
use std::time::Duration;

/// Argon2id parameters mandated by the spec: 64 MiB memory cost, 3
/// iterations, 4-way parallelism, 32-byte output and salt.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncryptionBenchmark {
    pub algorithm: EncryptionAlgorithm,
    pub time: Duration,
    pub throughput_mb_per_sec: f64,
}

/// A single scored issue/recommendation from [`EncryptionService::analyze_passphrase`].
#[derive(Debug, Clone)]
pub struct PassphraseStrength {
    pub score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Domain service contract for key derivation and AEAD encrypt/decrypt.
pub trait EncryptionService: Send + Sync {
    /// Derives key material from a passphrase via Argon2id, caching the
    /// result by `(passphrase, salt)` for the lifetime of the service.
    fn derive_key(&self, passphrase: &str, salt: Option<&[u8]>) -> Result<KeyMaterial, StorageError>;

    fn generate_key(&self) -> Result<KeyMaterial, StorageError>;

    fn encrypt(
        &self,
        plaintext: &[u8],
        key: &KeyMaterial,
        algorithm: EncryptionAlgorithm,
    ) -> Result<EncryptedData, StorageError>;

    fn decrypt(&self, envelope: &EncryptedData, key: &KeyMaterial) -> Result<Vec<u8>, StorageError>;

    /// Structural check: does `value` look like an `EncryptedData` envelope?
    fn is_encrypted(&self, value: &serde_json::Value) -> bool {
        crate::encrypted_data::looks_like_encrypted_data(value)
    }

    /// Encrypts the dotted-path fields of a JSON object in place; paths that
    /// don't resolve are skipped.
    fn encrypt_fields(
        &self,
        value: &mut serde_json::Value,
        paths: &[String],
        key: &KeyMaterial,
        algorithm: EncryptionAlgorithm,
    ) -> Result<(), StorageError>;

    fn decrypt_fields(
        &self,
        value: &mut serde_json::Value,
        paths: &[String],
        key: &KeyMaterial,
    ) -> Result<(), StorageError>;

    fn analyze_passphrase(&self, passphrase: &str) -> PassphraseStrength;

    fn benchmark(&self, algorithm: EncryptionAlgorithm, sample: &[u8]) -> Result<EncryptionBenchmark, StorageError>;

    fn supported_algorithms(&self) -> Vec<EncryptionAlgorithm>;
}
