// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sealed Vault
//!
//! Concrete [`Vault`] implementation: every secret is encrypted twice, once
//! under a per-vault key (rotatable without touching the caller's
//! passphrase) and again under a key derived from that passphrase. Reading
//! the backing adapter alone discloses nothing without both layers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::warn;

use strongbox_domain::adapter::StorageAdapter;
use strongbox_domain::config::VaultConfig;
use strongbox_domain::encrypted_data::{EncryptedData, KeyMaterial};
use strongbox_domain::encryption::EncryptionService;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::vault::{Vault, VaultAction, VaultAuditEntry, VaultBackup, VaultStats};

const ENCRYPTION_KEY_NAME: &str = "encryption-key";
const KEY_VERSION_NAME: &str = "__key_version__";
const LAST_ROTATION_NAME: &str = "__last_rotation__";

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn is_reserved(local_key: &str) -> bool {
    matches!(local_key, ENCRYPTION_KEY_NAME | KEY_VERSION_NAME | LAST_ROTATION_NAME)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultEntry {
    data: EncryptedData,
    created_at: i64,
    last_accessed: i64,
    access_count: u64,
    key_version: u32,
    #[serde(default)]
    metadata: Option<Value>,
}

pub struct SealedVault {
    adapter: Arc<dyn StorageAdapter>,
    encryption: Arc<dyn EncryptionService>,
    config: VaultConfig,
    vault_key: Mutex<KeyMaterial>,
    master_key: KeyMaterial,
    key_version: Mutex<u32>,
    last_rotation_at: Mutex<Option<i64>>,
    audit_log: Mutex<Vec<VaultAuditEntry>>,
    rotation_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SealedVault {
    pub async fn new(
        adapter: Arc<dyn StorageAdapter>,
        encryption: Arc<dyn EncryptionService>,
        config: VaultConfig,
    ) -> Result<Self, StorageError> {
        let key_name = StorageKey::namespaced(&config.namespace, ENCRYPTION_KEY_NAME)?;
        let version_name = StorageKey::namespaced(&config.namespace, KEY_VERSION_NAME)?;
        let rotation_name = StorageKey::namespaced(&config.namespace, LAST_ROTATION_NAME)?;

        let vault_key = match adapter.get(&key_name).await? {
            Some(Value::String(encoded)) => {
                let bytes = BASE64
                    .decode(&encoded)
                    .map_err(|e| StorageError::vault_error(format!("corrupt vault encryption-key: {e}")))?;
                KeyMaterial::new(bytes, Vec::new())
            }
            _ => {
                let generated = encryption.generate_key()?;
                adapter.set(&key_name, Value::String(BASE64.encode(&generated.key))).await?;
                generated
            }
        };

        let key_version = match adapter.get(&version_name).await? {
            Some(v) => v.as_u64().unwrap_or(1) as u32,
            None => {
                adapter.set(&version_name, serde_json::json!(1)).await?;
                1
            }
        };

        let last_rotation_at = adapter.get(&rotation_name).await?.and_then(|v| v.as_i64());

        let master_key = encryption.derive_key(&config.passphrase, None)?;

        Ok(Self {
            adapter,
            encryption,
            config,
            vault_key: Mutex::new(vault_key),
            master_key,
            key_version: Mutex::new(key_version),
            last_rotation_at: Mutex::new(last_rotation_at),
            audit_log: Mutex::new(Vec::new()),
            rotation_handle: Mutex::new(None),
        })
    }

    /// Starts a background task that calls [`Vault::rotate_keys`] every
    /// `config.key_rotation_interval_ms`, if `config.auto_rotate_keys` is
    /// set. Must be called from within a Tokio runtime; `SealedVault::new`
    /// itself doesn't spawn anything so it stays usable from plain
    /// `#[test]` functions. Call `close` to stop the timer.
    pub fn spawn_rotation_timer(self: &Arc<Self>) {
        if !self.config.auto_rotate_keys {
            return;
        }
        let interval_ms = self.config.key_rotation_interval_ms.max(1);
        let vault = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = vault.rotate_keys().await {
                    warn!(error = %e, "scheduled vault key rotation failed");
                }
            }
        });
        *self.rotation_handle.lock() = Some(handle);
    }

    fn record(&self, key: &str, action: VaultAction, success: bool) {
        if !self.config.audit_enabled {
            return;
        }
        let mut log = self.audit_log.lock();
        log.push(VaultAuditEntry {
            key: key.to_string(),
            action,
            timestamp: now_ms(),
            success,
        });
        let max = self.config.max_access_log_size;
        if log.len() > max {
            let overflow = log.len() - max;
            log.drain(0..overflow);
        }
    }

    fn key_for(&self, key: &str) -> Result<StorageKey, StorageError> {
        StorageKey::namespaced(&self.config.namespace, key)
    }

    fn wrap(&self, plaintext: &[u8], vault_key: &KeyMaterial) -> Result<EncryptedData, StorageError> {
        let inner = self.encryption.encrypt(plaintext, vault_key, self.config.algorithm)?;
        let inner_bytes = serde_json::to_vec(&inner)?;
        self.encryption.encrypt(&inner_bytes, &self.master_key, self.config.algorithm)
    }

    fn unwrap(&self, outer: &EncryptedData, vault_key: &KeyMaterial) -> Result<Vec<u8>, StorageError> {
        let inner_bytes = self.encryption.decrypt(outer, &self.master_key)?;
        let inner: EncryptedData = serde_json::from_slice(&inner_bytes)?;
        self.encryption.decrypt(&inner, vault_key)
    }

    async fn read_entry(&self, key: &StorageKey) -> Result<Option<VaultEntry>, StorageError> {
        match self.adapter.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Vault for SealedVault {
    async fn store(&self, key: &str, value: &str, metadata: Option<Value>) -> Result<(), StorageError> {
        let vault_key = self.vault_key.lock().clone();
        let outcome: Result<(), StorageError> = async {
            let data = self.wrap(value.as_bytes(), &vault_key)?;
            let now = now_ms();
            let entry = VaultEntry {
                data,
                created_at: now,
                last_accessed: now,
                access_count: 0,
                key_version: *self.key_version.lock(),
                metadata,
            };
            self.adapter.set(&self.key_for(key)?, serde_json::to_value(entry)?).await
        }
        .await;
        self.record(key, VaultAction::Store, outcome.is_ok());
        outcome
    }

    async fn retrieve(&self, key: &str) -> Result<Option<String>, StorageError> {
        let vault_key = self.vault_key.lock().clone();
        let outcome: Result<Option<String>, StorageError> = async {
            let storage_key = self.key_for(key)?;
            let Some(mut entry) = self.read_entry(&storage_key).await? else {
                return Ok(None);
            };
            let plaintext = self.unwrap(&entry.data, &vault_key)?;
            let value = String::from_utf8(plaintext)
                .map_err(|e| StorageError::DataCorruption(format!("vault entry is not valid utf-8: {e}")))?;

            entry.last_accessed = now_ms();
            entry.access_count += 1;
            self.adapter.set(&storage_key, serde_json::to_value(&entry)?).await?;

            Ok(Some(value))
        }
        .await;
        self.record(key, VaultAction::Retrieve, outcome.is_ok());
        outcome
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let outcome = self.adapter.delete(&self.key_for(key)?).await;
        self.record(key, VaultAction::Delete, outcome.is_ok());
        outcome
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        let prefix = StorageKey::namespace_prefix(&self.config.namespace);
        let keys = self.adapter.list(Some(&prefix)).await?;
        Ok(keys
            .into_iter()
            .map(|k| k.local_part().to_string())
            .filter(|local| !is_reserved(local))
            .collect())
    }

    async fn rotate_keys(&self) -> Result<u64, StorageError> {
        let old_key = self.vault_key.lock().clone();
        let new_key = self.encryption.generate_key()?;
        let new_version = *self.key_version.lock() + 1;

        let mut rotated = 0u64;
        for key in self.list_keys().await? {
            let storage_key = self.key_for(&key)?;
            let Some(mut entry) = self.read_entry(&storage_key).await? else {
                continue;
            };
            let plaintext = self.unwrap(&entry.data, &old_key)?;
            entry.data = self.wrap(&plaintext, &new_key)?;
            entry.key_version = new_version;
            self.adapter.set(&storage_key, serde_json::to_value(&entry)?).await?;
            rotated += 1;
        }

        self.adapter
            .set(
                &self.key_for(ENCRYPTION_KEY_NAME)?,
                Value::String(BASE64.encode(&new_key.key)),
            )
            .await?;
        self.adapter
            .set(&self.key_for(KEY_VERSION_NAME)?, serde_json::json!(new_version))
            .await?;
        let rotated_at = now_ms();
        self.adapter
            .set(&self.key_for(LAST_ROTATION_NAME)?, serde_json::json!(rotated_at))
            .await?;

        *self.vault_key.lock() = new_key;
        *self.key_version.lock() = new_version;
        *self.last_rotation_at.lock() = Some(rotated_at);

        self.record("__rotation__", VaultAction::Rotate, true);
        Ok(rotated)
    }

    async fn audit_log(&self) -> Result<Vec<VaultAuditEntry>, StorageError> {
        Ok(self.audit_log.lock().clone())
    }

    /// Backs up with a single AEAD layer under the vault key (not the full
    /// double-wrap `store` uses): a backup is only ever meant to be restored
    /// into a vault holding the same vault key, so the outer passphrase
    /// layer would add nothing but cost here.
    async fn backup(&self) -> Result<VaultBackup, StorageError> {
        let vault_key = self.vault_key.lock().clone();
        let mut entries = std::collections::HashMap::new();
        for key in self.list_keys().await? {
            if let Some(entry) = self.read_entry(&self.key_for(&key)?).await? {
                entries.insert(key, entry);
            }
        }
        let entry_count = entries.len() as u64;
        let plaintext = serde_json::to_vec(&entries)?;
        let encrypted = self.encryption.encrypt(&plaintext, &vault_key, self.config.algorithm)?;
        let created_at = now_ms();
        self.record("__backup__", VaultAction::Backup, true);

        Ok(VaultBackup {
            data: serde_json::to_string(&encrypted)?,
            created_at,
            entry_count,
        })
    }

    async fn restore(&self, backup: &VaultBackup) -> Result<u64, StorageError> {
        let vault_key = self.vault_key.lock().clone();
        let outcome: Result<u64, StorageError> = async {
            let encrypted: EncryptedData = serde_json::from_str(&backup.data)?;
            let plaintext = self.encryption.decrypt(&encrypted, &vault_key)?;
            let entries: std::collections::HashMap<String, VaultEntry> = serde_json::from_slice(&plaintext)?;
            let count = entries.len() as u64;
            for (key, entry) in entries {
                self.adapter.set(&self.key_for(&key)?, serde_json::to_value(entry)?).await?;
            }
            Ok(count)
        }
        .await;
        self.record("__restore__", VaultAction::Restore, outcome.is_ok());
        outcome
    }

    async fn stats(&self) -> Result<VaultStats, StorageError> {
        Ok(VaultStats {
            entry_count: self.list_keys().await?.len() as u64,
            audit_log_size: self.audit_log.lock().len() as u64,
            current_key_version: *self.key_version.lock(),
            last_rotation_at: *self.last_rotation_at.lock(),
        })
    }
}

impl SealedVault {
    /// Zeroizes the in-memory vault key and clears the audit log. Does not
    /// touch persisted entries; call [`Vault::delete`]/`clear` first if a
    /// full wipe is wanted.
    pub fn close(&self) {
        if let Some(handle) = self.rotation_handle.lock().take() {
            handle.abort();
        }
        *self.vault_key.lock() = KeyMaterial::new(Vec::new(), Vec::new());
        self.audit_log.lock().clear();
    }

    /// Closes the vault and deletes every entry it owns, reserved keys
    /// included.
    pub async fn destroy(&self) -> Result<(), StorageError> {
        let prefix = StorageKey::namespace_prefix(&self.config.namespace);
        for key in self.adapter.list(Some(&prefix)).await? {
            self.adapter.delete(&key).await?;
        }
        self.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStorage, PipelineAdapter};
    use crate::compression::MultiAlgoCompression;
    use crate::encryption::MultiAlgoEncryption;
    use strongbox_domain::config::StorageConfig;

    async fn vault() -> SealedVault {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(
            PipelineAdapter::new(
                MemoryStorage::new(),
                StorageConfig::default(),
                Arc::new(MultiAlgoCompression::new()),
                Arc::new(MultiAlgoEncryption::new()),
                None,
            )
            .unwrap(),
        );
        let encryption = Arc::new(MultiAlgoEncryption::new());
        SealedVault::new(adapter, encryption, VaultConfig::new("correct horse battery staple"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let vault = vault().await;
        vault.store("api-token", "super-secret", None).await.unwrap();
        assert_eq!(vault.retrieve("api-token").await.unwrap().unwrap(), "super-secret");
    }

    #[tokio::test]
    async fn list_keys_excludes_reserved_entries() {
        let vault = vault().await;
        vault.store("api-token", "x", None).await.unwrap();
        let keys = vault.list_keys().await.unwrap();
        assert_eq!(keys, vec!["api-token".to_string()]);
    }

    #[tokio::test]
    async fn rotate_keys_preserves_data() {
        let vault = vault().await;
        vault.store("api-token", "super-secret", None).await.unwrap();
        let rotated = vault.rotate_keys().await.unwrap();
        assert_eq!(rotated, 1);
        assert_eq!(vault.retrieve("api-token").await.unwrap().unwrap(), "super-secret");
        assert_eq!(vault.stats().await.unwrap().current_key_version, 2);
    }

    #[tokio::test]
    async fn backup_then_restore_recovers_a_deleted_entry() {
        let vault = vault().await;
        vault.store("api-token", "super-secret", None).await.unwrap();
        let backup = vault.backup().await.unwrap();
        assert_eq!(backup.entry_count, 1);

        vault.delete("api-token").await.unwrap();
        assert!(vault.retrieve("api-token").await.unwrap().is_none());

        let restored = vault.restore(&backup).await.unwrap();
        assert_eq!(restored, 1);
        assert_eq!(vault.retrieve("api-token").await.unwrap().unwrap(), "super-secret");
    }

    #[tokio::test]
    async fn audit_log_records_store_and_retrieve() {
        let vault = vault().await;
        vault.store("api-token", "x", None).await.unwrap();
        vault.retrieve("api-token").await.unwrap();
        let log = vault.audit_log().await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, VaultAction::Store);
        assert_eq!(log[1].action, VaultAction::Retrieve);
    }
}
