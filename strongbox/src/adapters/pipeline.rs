// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Generic Storage Pipeline
//!
//! Wraps any [`RawStorage`] backend with the serialize → compress → encrypt
//! → persist pipeline (and its inverse on read), plus an optional read-through
//! cache. This is the one place the pipeline bookkeeping is written; every
//! backend gets it for free by implementing the much smaller `RawStorage`
//! contract instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde_json::Value;

use strongbox_domain::adapter::{RawStorage, StorageAdapter};
use strongbox_domain::compression::CompressionService;
use strongbox_domain::config::StorageConfig;
use strongbox_domain::encrypted_data::{EncryptedData, KeyMaterial};
use strongbox_domain::encryption::EncryptionService;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::metadata::RecordMetadata;

use crate::cache::Cache;

/// Wraps a `RawStorage` backend with the full pipeline contract.
pub struct PipelineAdapter<R: RawStorage> {
    raw: R,
    compression: Arc<dyn CompressionService>,
    encryption: Arc<dyn EncryptionService>,
    cache: Option<Arc<Cache>>,
    config: StorageConfig,
    key: Option<KeyMaterial>,
}

impl<R: RawStorage> PipelineAdapter<R> {
    pub fn new(
        raw: R,
        config: StorageConfig,
        compression: Arc<dyn CompressionService>,
        encryption: Arc<dyn EncryptionService>,
        cache: Option<Arc<Cache>>,
    ) -> Result<Self, StorageError> {
        let key = if config.encryption.enabled {
            let passphrase = config
                .encryption
                .passphrase
                .as_deref()
                .ok_or_else(|| StorageError::initialization("encryption enabled but no passphrase configured"))?;
            Some(encryption.derive_key(passphrase, None)?)
        } else {
            None
        };

        Ok(Self {
            raw,
            compression,
            encryption,
            cache,
            config,
            key,
        })
    }

    fn encode(&self, value: &Value) -> Result<(Value, RecordMetadata), StorageError> {
        let now = Utc::now().timestamp_millis();
        let json_bytes = serde_json::to_vec(value)?;
        let original_size = json_bytes.len() as u64;

        let outcome = self.compression.compress(&json_bytes, &self.config.compression)?;
        let mut metadata = RecordMetadata::new(now, original_size);
        metadata.compressed = outcome.compressed;
        metadata.compression_algorithm = outcome.algorithm;
        metadata.compressed_size = outcome.data.len() as u64;

        if self.config.encryption.enabled {
            let key = self
                .key
                .as_ref()
                .ok_or_else(|| StorageError::initialization("encryption enabled but no key material derived"))?;
            let envelope = self
                .encryption
                .encrypt(&outcome.data, key, self.config.encryption.algorithm)?;
            metadata.encrypted = true;
            metadata.original_size = outcome.data.len() as u64;
            Ok((serde_json::to_value(envelope)?, metadata))
        } else if outcome.compressed {
            Ok((Value::String(BASE64.encode(&outcome.data)), metadata))
        } else {
            Ok((value.clone(), metadata))
        }
    }

    fn decode(&self, stored: Value, metadata: &RecordMetadata) -> Result<Value, StorageError> {
        let inner_bytes = if metadata.encrypted {
            let key = self
                .key
                .as_ref()
                .ok_or_else(|| StorageError::initialization("record is encrypted but no key material available"))?;
            let envelope: EncryptedData = serde_json::from_value(stored)?;
            self.encryption.decrypt(&envelope, key)?
        } else if metadata.compressed {
            let encoded = stored
                .as_str()
                .ok_or_else(|| StorageError::DataCorruption("compressed record is not a base64 string".into()))?;
            BASE64
                .decode(encoded)
                .map_err(|e| StorageError::DataCorruption(format!("invalid base64 payload: {e}")))?
        } else {
            return Ok(stored);
        };

        let json_bytes = self
            .compression
            .decompress(&inner_bytes, metadata.compression_algorithm, metadata.compressed)?;
        Ok(serde_json::from_slice(&json_bytes)?)
    }
}

#[async_trait]
impl<R: RawStorage> StorageAdapter for PipelineAdapter<R> {
    async fn get(&self, key: &StorageKey) -> Result<Option<Value>, StorageError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(key) {
                return Ok(Some(hit));
            }
        }

        let Some((stored, metadata)) = self.raw.get_raw(key).await? else {
            return Ok(None);
        };
        let value = self.decode(stored, &metadata)?;

        if let Some(cache) = &self.cache {
            cache.set(key.clone(), value.clone());
        }
        Ok(Some(value))
    }

    async fn set(&self, key: &StorageKey, value: Value) -> Result<(), StorageError> {
        let (stored, metadata) = self.encode(&value)?;
        self.raw.set_raw(key, stored, metadata).await?;
        if let Some(cache) = &self.cache {
            cache.set(key.clone(), value);
        }
        Ok(())
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError> {
        let removed = self.raw.delete_raw(key).await?;
        if let Some(cache) = &self.cache {
            cache.delete(key);
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.raw.clear_raw().await?;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        Ok(())
    }

    async fn get_many(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Option<Value>>, StorageError> {
        let mut results = HashMap::with_capacity(keys.len());
        for key in keys {
            results.insert(key.clone(), self.get(key).await?);
        }
        Ok(results)
    }

    async fn set_many(&self, entries: HashMap<StorageKey, Value>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError> {
        self.raw.list_raw(prefix).await
    }

    async fn count(&self, prefix: Option<&str>) -> Result<u64, StorageError> {
        self.raw.count_raw(prefix).await
    }

    async fn has(&self, key: &StorageKey) -> Result<bool, StorageError> {
        self.raw.has_raw(key).await
    }

    async fn size_bytes(&self) -> Result<u64, StorageError> {
        self.raw.size_bytes_raw().await
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        self.raw.initialize().await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.raw.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStorage;
    use crate::compression::MultiAlgoCompression;
    use crate::encryption::MultiAlgoEncryption;
    use strongbox_domain::config::{CacheConfig, CompressionConfig};

    fn key(s: &str) -> StorageKey {
        StorageKey::new(s).unwrap()
    }

    fn adapter(config: StorageConfig) -> PipelineAdapter<MemoryStorage> {
        PipelineAdapter::new(
            MemoryStorage::new(),
            config,
            Arc::new(MultiAlgoCompression::new()),
            Arc::new(MultiAlgoEncryption::new()),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn plain_round_trip_with_no_compression_or_encryption() {
        let adapter = adapter(StorageConfig::default());
        let k = key("default:a");
        adapter.set(&k, serde_json::json!({"name": "Alice"})).await.unwrap();
        let value = adapter.get(&k).await.unwrap().unwrap();
        assert_eq!(value, serde_json::json!({"name": "Alice"}));
    }

    #[tokio::test]
    async fn round_trip_with_compression_enabled() {
        let mut config = StorageConfig::default();
        config.compression = CompressionConfig {
            enabled: true,
            min_size: 1,
            ..CompressionConfig::default()
        };
        let adapter = adapter(config);
        let k = key("default:a");
        let payload = serde_json::json!({"text": "x".repeat(2000)});
        adapter.set(&k, payload.clone()).await.unwrap();
        assert_eq!(adapter.get(&k).await.unwrap().unwrap(), payload);
    }

    #[tokio::test]
    async fn round_trip_with_encryption_enabled() {
        let mut config = StorageConfig::default();
        config.encryption.enabled = true;
        config.encryption.passphrase = Some("correct horse battery staple".to_string());
        let adapter = adapter(config);
        let k = key("default:secret");
        let payload = serde_json::json!({"token": "xyz"});
        adapter.set(&k, payload.clone()).await.unwrap();
        assert_eq!(adapter.get(&k).await.unwrap().unwrap(), payload);
    }

    #[tokio::test]
    async fn cache_is_populated_and_served_on_hit() {
        let cache = Arc::new(Cache::new(CacheConfig::default()));
        let adapter = PipelineAdapter::new(
            MemoryStorage::new(),
            StorageConfig::default(),
            Arc::new(MultiAlgoCompression::new()),
            Arc::new(MultiAlgoEncryption::new()),
            Some(cache.clone()),
        )
        .unwrap();
        let k = key("default:cached");
        adapter.set(&k, serde_json::json!(42)).await.unwrap();
        assert!(cache.get(&k).is_some());
        adapter.delete(&k).await.unwrap();
        assert!(cache.get(&k).is_none());
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let adapter = adapter(StorageConfig::default());
        assert!(adapter.get(&key("default:missing")).await.unwrap().is_none());
    }
}
