// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Raw Storage
//!
//! A `HashMap`-backed [`RawStorage`] implementation. Volatile: contents are
//! lost on drop. Useful for tests and for callers that only need a scratch
//! working set behind the same pipeline every other adapter gets.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use strongbox_domain::adapter::RawStorage;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::metadata::RecordMetadata;

pub struct MemoryStorage {
    data: RwLock<HashMap<String, (Value, RecordMetadata)>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RawStorage for MemoryStorage {
    async fn get_raw(&self, key: &StorageKey) -> Result<Option<(Value, RecordMetadata)>, StorageError> {
        Ok(self.data.read().await.get(key.as_str()).cloned())
    }

    async fn set_raw(&self, key: &StorageKey, value: Value, metadata: RecordMetadata) -> Result<(), StorageError> {
        self.data.write().await.insert(key.as_str().to_string(), (value, metadata));
        Ok(())
    }

    async fn delete_raw(&self, key: &StorageKey) -> Result<bool, StorageError> {
        Ok(self.data.write().await.remove(key.as_str()).is_some())
    }

    async fn clear_raw(&self) -> Result<(), StorageError> {
        self.data.write().await.clear();
        Ok(())
    }

    async fn list_raw(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError> {
        let data = self.data.read().await;
        data.keys()
            .filter(|k| prefix.is_none_or(|p| k.starts_with(p)))
            .map(|k| StorageKey::new(k.clone()))
            .collect()
    }

    async fn count_raw(&self, prefix: Option<&str>) -> Result<u64, StorageError> {
        let data = self.data.read().await;
        Ok(data.keys().filter(|k| prefix.is_none_or(|p| k.starts_with(p))).count() as u64)
    }

    async fn has_raw(&self, key: &StorageKey) -> Result<bool, StorageError> {
        Ok(self.data.read().await.contains_key(key.as_str()))
    }

    async fn size_bytes_raw(&self) -> Result<u64, StorageError> {
        let data = self.data.read().await;
        let mut total = 0u64;
        for (k, (v, meta)) in data.iter() {
            total += 2 * k.len() as u64;
            total += 2 * serde_json::to_vec(v).map(|b| b.len() as u64).unwrap_or(0);
            total += 2 * serde_json::to_vec(meta).map(|b| b.len() as u64).unwrap_or(0);
        }
        Ok(total)
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StorageKey {
        StorageKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let storage = MemoryStorage::new();
        let meta = RecordMetadata::new(0, 5);
        storage
            .set_raw(&key("default:a"), serde_json::json!("hi"), meta)
            .await
            .unwrap();
        let (value, _) = storage.get_raw(&key("default:a")).await.unwrap().unwrap();
        assert_eq!(value, serde_json::json!("hi"));
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let storage = MemoryStorage::new();
        let meta = RecordMetadata::new(0, 1);
        storage
            .set_raw(&key("users:1"), serde_json::json!(1), meta.clone())
            .await
            .unwrap();
        storage
            .set_raw(&key("orders:1"), serde_json::json!(1), meta)
            .await
            .unwrap();
        let keys = storage.list_raw(Some("users:")).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "users:1");
    }

    #[tokio::test]
    async fn delete_reports_whether_key_existed() {
        let storage = MemoryStorage::new();
        let meta = RecordMetadata::new(0, 1);
        storage.set_raw(&key("default:a"), serde_json::json!(1), meta).await.unwrap();
        assert!(storage.delete_raw(&key("default:a")).await.unwrap());
        assert!(!storage.delete_raw(&key("default:a")).await.unwrap());
    }
}
