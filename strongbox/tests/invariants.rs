// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cross-cutting invariants that must hold regardless of which adapter or
//! namespace is in play: idempotent writes, list/count agreement, key
//! validation, and batch-read completeness.

use std::collections::HashMap;

use serde_json::json;
use strongbox::{StorageConfig, StorageError, StorageKey, StorageManager};

#[tokio::test]
async fn repeated_set_leaves_a_single_record() {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    let key = StorageKey::new("users:1").unwrap();
    manager.set(&key, json!({"v": 1})).await.unwrap();
    manager.set(&key, json!({"v": 2})).await.unwrap();

    assert_eq!(manager.count(Some("users:")).await.unwrap(), 1);
    assert_eq!(manager.get(&key).await.unwrap().unwrap()["v"], 2);
}

#[tokio::test]
async fn clearing_an_empty_namespace_twice_is_a_no_op() {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    let ns = manager.namespace("scratch");
    assert_eq!(ns.clear().await.unwrap(), 0);
    assert_eq!(ns.clear().await.unwrap(), 0);
}

#[tokio::test]
async fn count_matches_list_length_for_a_prefix() {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    for i in 0..5 {
        manager
            .namespace("widgets")
            .set(&i.to_string(), json!({"i": i}))
            .await
            .unwrap();
    }

    let listed = manager.list(Some("widgets:")).await.unwrap();
    let counted = manager.count(Some("widgets:")).await.unwrap();
    assert_eq!(listed.len() as u64, counted);
}

#[tokio::test]
async fn empty_key_is_rejected_before_it_reaches_storage() {
    assert!(matches!(StorageKey::new(""), Err(StorageError::InvalidKey(_))));
}

#[tokio::test]
async fn oversized_key_is_rejected_and_storage_is_unchanged() {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    let huge = "x".repeat(10_000);
    assert!(matches!(StorageKey::new(huge), Err(StorageError::InvalidKey(_))));
    assert_eq!(manager.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn get_many_returns_an_entry_for_every_requested_key() {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    let present = StorageKey::new("users:1").unwrap();
    let missing = StorageKey::new("users:2").unwrap();
    manager.set(&present, json!({"name": "Alice"})).await.unwrap();

    let mut requested = HashMap::new();
    requested.insert(present.clone(), json!({"name": "Alice"}));
    manager.set_many(requested).await.unwrap();

    let results = manager
        .get_many(&[present.clone(), missing.clone()])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.get(&present).unwrap().is_some());
    assert!(results.get(&missing).unwrap().is_none());
}
