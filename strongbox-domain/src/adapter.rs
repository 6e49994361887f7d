// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Adapter Contract
//!
//! This module defines the two-layer abstraction the engine crate's adapters
//! implement:
//!
//! - [`RawStorage`]: the minimal persistence capability a backend provides
//!   (get/set/delete/clear of already-encoded bytes, plus listing and
//!   lifecycle). Implementing this is all a new backend has to do.
//! - [`StorageAdapter`]: the full pipeline contract (serialize, optionally
//!   compress, optionally encrypt, persist, and the inverse on read) that
//!   every backend gets "for free" by wrapping a `RawStorage` in the engine
//!   crate's generic pipeline type.
//!
//! Keeping these separate means the compression/encryption/caching/metadata
//! bookkeeping logic is written and tested exactly once, against
//! `RawStorage`, instead of once per backend.

use crate::error::StorageError;
use crate::key::StorageKey;
use crate::metadata::RecordMetadata;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// The minimal capability a storage backend must provide: byte-level
/// get/set/delete of an already-serialized (and possibly compressed/
/// encrypted) record plus its metadata.
#[async_trait]
pub trait RawStorage: Send + Sync {
    async fn get_raw(&self, key: &StorageKey) -> Result<Option<(Value, RecordMetadata)>, StorageError>;

    async fn set_raw(&self, key: &StorageKey, value: Value, metadata: RecordMetadata) -> Result<(), StorageError>;

    async fn delete_raw(&self, key: &StorageKey) -> Result<bool, StorageError>;

    async fn clear_raw(&self) -> Result<(), StorageError>;

    async fn list_raw(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError>;

    async fn count_raw(&self, prefix: Option<&str>) -> Result<u64, StorageError>;

    async fn has_raw(&self, key: &StorageKey) -> Result<bool, StorageError>;

    async fn size_bytes_raw(&self) -> Result<u64, StorageError>;

    async fn initialize(&self) -> Result<(), StorageError>;

    async fn close(&self) -> Result<(), StorageError>;
}

/// The full storage-adapter contract exposed to application code: a
/// `RawStorage` wrapped by the serialize/compress/encrypt pipeline.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get(&self, key: &StorageKey) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &StorageKey, value: Value) -> Result<(), StorageError>;

    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    async fn get_many(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Option<Value>>, StorageError>;

    async fn set_many(&self, entries: HashMap<StorageKey, Value>) -> Result<(), StorageError>;

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError>;

    async fn count(&self, prefix: Option<&str>) -> Result<u64, StorageError>;

    async fn has(&self, key: &StorageKey) -> Result<bool, StorageError>;

    async fn size_bytes(&self) -> Result<u64, StorageError>;

    async fn initialize(&self) -> Result<(), StorageError>;

    async fn close(&self) -> Result<(), StorageError>;
}
