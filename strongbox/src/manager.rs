// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Manager
//!
//! The top-level façade: picks an adapter from [`AdapterKind`], wires it
//! through the migration manager, and (when encryption is enabled) stands up
//! a [`crate::vault::SealedVault`]. Every delegated method is guarded so it
//! returns `initialization` before [`StorageManager::initialize`] has run.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{info, warn};

use strongbox_domain::adapter::StorageAdapter;
use strongbox_domain::config::{AdapterKind, StorageConfig};
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::migration::Migration;

use crate::adapters::{MemoryStorage, PipelineAdapter, SqlStorage};
use crate::cache::Cache;
use crate::compression::MultiAlgoCompression;
use crate::encryption::MultiAlgoEncryption;
use crate::migration::MigrationManager;
use crate::vault::SealedVault;

/// A view over a `StorageManager` whose keys are all implicitly prefixed
/// with `"{namespace}:"`, and whose `list` strips that prefix back off.
pub struct Namespace<'a> {
    manager: &'a StorageManager,
    name: String,
}

impl<'a> Namespace<'a> {
    fn qualify(&self, key: &str) -> Result<StorageKey, StorageError> {
        StorageKey::namespaced(&self.name, key)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.manager.get(&self.qualify(key)?).await
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.manager.set(&self.qualify(key)?, value).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.manager.delete(&self.qualify(key)?).await
    }

    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let prefix = StorageKey::namespace_prefix(&self.name);
        let keys = self.manager.list(Some(&prefix)).await?;
        Ok(keys
            .into_iter()
            .map(|k| k.local_part().to_string())
            .collect())
    }

    pub async fn count(&self) -> Result<u64, StorageError> {
        self.manager.count(Some(&StorageKey::namespace_prefix(&self.name))).await
    }

    /// Deletes every key under this namespace. Not atomic: concurrent writers
    /// into the same namespace may see a partially-cleared view.
    pub async fn clear(&self) -> Result<u64, StorageError> {
        let prefix = StorageKey::namespace_prefix(&self.name);
        let keys = self.manager.list(Some(&prefix)).await?;
        let mut removed = 0u64;
        for key in &keys {
            if self.manager.delete(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Cheap, read-only operational snapshot. See `StorageManager::health`.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub initialized: bool,
    pub namespace_count: u64,
    pub size_bytes: u64,
    pub cache_hit_ratio: Option<f64>,
    pub last_migration_applied: Option<String>,
}

struct Initialized {
    adapter: Arc<dyn StorageAdapter>,
    cache: Option<Arc<Cache>>,
    migrations: MigrationManager,
    vault: Option<Arc<SealedVault>>,
}

pub struct StorageManager {
    config: StorageConfig,
    pending_migrations: RwLock<Vec<Arc<dyn Migration>>>,
    state: RwLock<Option<Initialized>>,
}

impl StorageManager {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            pending_migrations: RwLock::new(Vec::new()),
            state: RwLock::new(None),
        }
    }

    /// Queues a migration to be registered once `initialize` builds the
    /// migration manager. Calling this after `initialize` has no effect on
    /// migrations already registered; use the returned manager instead.
    pub fn add_migration(&self, migration: Arc<dyn Migration>) {
        self.pending_migrations.write().push(migration);
    }

    pub async fn initialize(&self) -> Result<(), StorageError> {
        let cache = if self.config.cache.max_items > 0 {
            let cache = Arc::new(Cache::new(self.config.cache.clone()));
            cache.spawn_sweeper();
            Some(cache)
        } else {
            None
        };
        let compression = Arc::new(MultiAlgoCompression::new());
        let encryption = Arc::new(MultiAlgoEncryption::new());

        let adapter: Arc<dyn StorageAdapter> = match self.config.kind {
            AdapterKind::Memory => Arc::new(PipelineAdapter::new(
                MemoryStorage::new(),
                self.config.clone(),
                compression.clone(),
                encryption.clone(),
                cache.clone(),
            )?),
            AdapterKind::Sqlite => {
                let path = self
                    .config
                    .path
                    .as_deref()
                    .ok_or_else(|| StorageError::initialization("sqlite adapter requires a path"))?;
                let sql = SqlStorage::connect(path).await?;
                Arc::new(PipelineAdapter::new(
                    sql,
                    self.config.clone(),
                    compression.clone(),
                    encryption.clone(),
                    cache.clone(),
                )?)
            }
            AdapterKind::Dexie => {
                return Err(StorageError::initialization("the dexie adapter is not supported in this runtime"))
            }
            AdapterKind::Custom => {
                return Err(StorageError::initialization("custom adapters are not supported in this runtime"))
            }
        };

        adapter.initialize().await?;

        let mut migrations = MigrationManager::new(adapter.clone());
        for migration in self.pending_migrations.write().drain(..) {
            migrations.register(migration);
        }
        if self.config.migrations.auto_migrate {
            let results = migrations.migrate().await?;
            for result in &results {
                if result.success {
                    info!(version = %result.version, "migration applied");
                } else {
                    warn!(version = %result.version, error = ?result.error, "migration failed");
                }
            }
        }

        let vault = if self.config.encryption.enabled {
            let vault_config = self
                .config
                .vault
                .clone()
                .unwrap_or_else(|| strongbox_domain::config::VaultConfig::new(
                    self.config
                        .encryption
                        .passphrase
                        .clone()
                        .unwrap_or_default(),
                ));
            let vault = Arc::new(SealedVault::new(adapter.clone(), encryption.clone(), vault_config).await?);
            vault.spawn_rotation_timer();
            Some(vault)
        } else {
            None
        };

        *self.state.write() = Some(Initialized {
            adapter,
            cache,
            migrations,
            vault,
        });
        Ok(())
    }

    fn require_state(&self) -> Result<parking_lot::MappedRwLockReadGuard<'_, Initialized>, StorageError> {
        let guard = self.state.read();
        if guard.is_none() {
            return Err(StorageError::initialization("storage manager used before initialize()"));
        }
        Ok(parking_lot::RwLockReadGuard::map(guard, |s| s.as_ref().unwrap()))
    }

    pub fn namespace(&self, name: impl Into<String>) -> Namespace<'_> {
        Namespace {
            manager: self,
            name: name.into(),
        }
    }

    pub async fn get(&self, key: &StorageKey) -> Result<Option<Value>, StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.get(key).await
    }

    pub async fn set(&self, key: &StorageKey, value: Value) -> Result<(), StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.set(key, value).await
    }

    pub async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.delete(key).await
    }

    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.list(prefix).await
    }

    pub async fn count(&self, prefix: Option<&str>) -> Result<u64, StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.count(prefix).await
    }

    pub async fn get_many(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Option<Value>>, StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.get_many(keys).await
    }

    pub async fn set_many(&self, entries: HashMap<StorageKey, Value>) -> Result<(), StorageError> {
        let adapter = self.require_state()?.adapter.clone();
        adapter.set_many(entries).await
    }

    pub fn adapter(&self) -> Result<Arc<dyn StorageAdapter>, StorageError> {
        Ok(self.require_state()?.adapter.clone())
    }

    pub fn cache(&self) -> Result<Option<Arc<Cache>>, StorageError> {
        Ok(self.require_state()?.cache.clone())
    }

    /// The vault storage, or `initialization` if encryption is off.
    pub fn vault_storage(&self) -> Result<Arc<SealedVault>, StorageError> {
        self.require_state()?
            .vault
            .clone()
            .ok_or_else(|| StorageError::initialization("encryption is disabled; no vault is available"))
    }

    pub async fn close(&self) -> Result<(), StorageError> {
        let (adapter, cache, vault) = {
            let state = self.require_state()?;
            (state.adapter.clone(), state.cache.clone(), state.vault.clone())
        };
        if let Some(cache) = cache {
            cache.close();
        }
        if let Some(vault) = vault {
            vault.close();
        }
        adapter.close().await?;
        *self.state.write() = None;
        Ok(())
    }

    /// Cheap, read-only operational probe: no I/O beyond `size_bytes()` and a
    /// `list`/`count` of the reserved migration key's namespace.
    pub async fn health(&self) -> Result<HealthReport, StorageError> {
        let guard = self.state.read();
        let Some(state) = guard.as_ref() else {
            return Ok(HealthReport {
                initialized: false,
                namespace_count: 0,
                size_bytes: 0,
                cache_hit_ratio: None,
                last_migration_applied: None,
            });
        };

        let size_bytes = state.adapter.size_bytes().await?;
        let all_keys = state.adapter.list(None).await?;
        let namespace_count = all_keys
            .iter()
            .map(|k| k.namespace())
            .collect::<std::collections::HashSet<_>>()
            .len() as u64;

        let cache_hit_ratio = state.cache.as_ref().map(|cache| {
            let stats = cache.stats();
            let total = stats.hits + stats.misses;
            if total == 0 {
                0.0
            } else {
                stats.hits as f64 / total as f64
            }
        });

        let last_migration_applied = state.migrations.history().await?.last().map(|entry| entry.version.clone());

        Ok(HealthReport {
            initialized: true,
            namespace_count,
            size_bytes,
            cache_hit_ratio,
            last_migration_applied,
        })
    }
}
