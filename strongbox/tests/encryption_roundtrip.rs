// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end encrypted storage through `StorageManager`. Tamper/corruption
//! of ciphertext is exercised at the encryption-service unit level
//! (`strongbox::encryption`, which owns the AEAD envelope), since the adapter
//! contract deliberately gives callers no way to reach the raw stored bytes
//! once a backend is wrapped in the pipeline.

use serde_json::json;
use strongbox::{EncryptionAlgorithm, StorageConfig, StorageKey, StorageManager};

fn encrypted_config() -> StorageConfig {
    let mut config = StorageConfig::default();
    config.encryption.enabled = true;
    config.encryption.passphrase = Some("correct horse battery staple".to_string());
    config.encryption.algorithm = EncryptionAlgorithm::Aes256Gcm;
    config
}

#[tokio::test]
async fn values_round_trip_when_encryption_is_enabled() {
    let manager = StorageManager::new(encrypted_config());
    manager.initialize().await.unwrap();

    let key = StorageKey::new("users:1").unwrap();
    let value = json!({"name": "Alice", "ssn": "000-00-0000"});
    manager.set(&key, value.clone()).await.unwrap();

    assert_eq!(manager.get(&key).await.unwrap().unwrap(), value);
}

#[tokio::test]
async fn enabling_encryption_without_a_passphrase_fails_initialization() {
    let mut config = StorageConfig::default();
    config.encryption.enabled = true;
    config.encryption.passphrase = None;

    let manager = StorageManager::new(config);
    assert!(manager.initialize().await.is_err());
}

#[tokio::test]
async fn chacha20_is_selectable_as_the_storage_algorithm() {
    let mut config = encrypted_config();
    config.encryption.algorithm = EncryptionAlgorithm::ChaCha20Poly1305;

    let manager = StorageManager::new(config);
    manager.initialize().await.unwrap();

    let key = StorageKey::new("users:1").unwrap();
    let value = json!({"name": "Bob"});
    manager.set(&key, value.clone()).await.unwrap();
    assert_eq!(manager.get(&key).await.unwrap().unwrap(), value);
}
