// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The sealed vault double-wraps secrets: the plaintext never appears in the
//! backing adapter's raw record, and rotating the inner key leaves stored
//! secrets readable.

use std::sync::Arc;

use strongbox::adapters::MemoryStorage;
use strongbox::{
    MultiAlgoCompression, MultiAlgoEncryption, PipelineAdapter, SealedVault, StorageAdapter, StorageConfig,
    StorageKey, Vault, VaultConfig,
};

async fn fresh_vault() -> (SealedVault, Arc<dyn StorageAdapter>) {
    let config = StorageConfig::default();
    let adapter: Arc<dyn StorageAdapter> = Arc::new(
        PipelineAdapter::new(
            MemoryStorage::new(),
            config,
            Arc::new(MultiAlgoCompression::new()),
            Arc::new(MultiAlgoEncryption::new()),
            None,
        )
        .unwrap(),
    );
    adapter.initialize().await.unwrap();

    let vault_config = VaultConfig::new("correct horse battery staple");
    let vault = SealedVault::new(adapter.clone(), Arc::new(MultiAlgoEncryption::new()), vault_config)
        .await
        .unwrap();
    (vault, adapter)
}

#[tokio::test]
async fn store_and_retrieve_round_trips_a_secret() {
    let (vault, _adapter) = fresh_vault().await;

    vault.store("github-token", "ghp_XXX", None).await.unwrap();
    let retrieved = vault.retrieve("github-token").await.unwrap();
    assert_eq!(retrieved.as_deref(), Some("ghp_XXX"));
}

#[tokio::test]
async fn the_backing_adapter_never_holds_the_plaintext_secret() {
    let (vault, adapter) = fresh_vault().await;
    vault.store("github-token", "ghp_XXX", None).await.unwrap();

    let raw_key = StorageKey::namespaced("vault", "github-token").unwrap();
    let raw_record = adapter.get(&raw_key).await.unwrap().unwrap();
    let raw_text = serde_json::to_string(&raw_record).unwrap();
    assert!(!raw_text.contains("ghp_XXX"));
}

#[tokio::test]
async fn rotating_keys_keeps_secrets_retrievable_and_advances_rotation_time() {
    let (vault, _adapter) = fresh_vault().await;
    vault.store("github-token", "ghp_XXX", None).await.unwrap();

    let stats_before = vault.stats().await.unwrap();
    assert!(stats_before.last_rotation_at.is_none());
    assert_eq!(stats_before.current_key_version, 1);

    let rotated = vault.rotate_keys().await.unwrap();
    assert_eq!(rotated, 1, "exactly the one stored secret should have been rewrapped");

    assert_eq!(vault.retrieve("github-token").await.unwrap().as_deref(), Some("ghp_XXX"));

    let stats_after_first = vault.stats().await.unwrap();
    assert!(stats_after_first.last_rotation_at.is_some());
    assert_eq!(stats_after_first.current_key_version, 2);

    vault.rotate_keys().await.unwrap();
    let stats_after_second = vault.stats().await.unwrap();
    assert_eq!(stats_after_second.current_key_version, 3);
    assert!(stats_after_second.last_rotation_at.unwrap() >= stats_after_first.last_rotation_at.unwrap());
    assert_eq!(vault.retrieve("github-token").await.unwrap().as_deref(), Some("ghp_XXX"));
}

#[tokio::test]
async fn two_vaults_over_the_same_adapter_keep_disjoint_namespaces() {
    let config = StorageConfig::default();
    let adapter: Arc<dyn StorageAdapter> = Arc::new(
        PipelineAdapter::new(
            MemoryStorage::new(),
            config,
            Arc::new(MultiAlgoCompression::new()),
            Arc::new(MultiAlgoEncryption::new()),
            None,
        )
        .unwrap(),
    );
    adapter.initialize().await.unwrap();

    let mut personal_config = VaultConfig::new("passphrase-one");
    personal_config.namespace = "personal".to_string();
    let personal = SealedVault::new(adapter.clone(), Arc::new(MultiAlgoEncryption::new()), personal_config)
        .await
        .unwrap();

    let mut work_config = VaultConfig::new("passphrase-two");
    work_config.namespace = "work".to_string();
    let work = SealedVault::new(adapter.clone(), Arc::new(MultiAlgoEncryption::new()), work_config)
        .await
        .unwrap();

    personal.store("api-key", "personal-secret", None).await.unwrap();
    work.store("api-key", "work-secret", None).await.unwrap();

    assert_eq!(personal.list_keys().await.unwrap(), vec!["api-key".to_string()]);
    assert_eq!(work.list_keys().await.unwrap(), vec!["api-key".to_string()]);
    assert_eq!(personal.retrieve("api-key").await.unwrap().as_deref(), Some("personal-secret"));
    assert_eq!(work.retrieve("api-key").await.unwrap().as_deref(), Some("work-secret"));
}
