// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Vault Contract
//!
//! A hardened secret store layered on top of a [`crate::adapter::StorageAdapter`]:
//! every entry is encrypted twice, once under a per-vault key and again under
//! a key derived from the caller's master passphrase, so a compromise of the
//! backing adapter alone (without the passphrase) discloses nothing.

use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultAction {
    Store,
    Retrieve,
    Delete,
    Rotate,
    Backup,
    Restore,
}

/// One line of the vault's append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultAuditEntry {
    pub key: String,
    pub action: VaultAction,
    pub timestamp: i64,
    pub success: bool,
}

/// A single secret as the caller sees it: a name and the plaintext, never the
/// double-encrypted envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSecret {
    pub key: String,
    pub value: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Incremented on every [`Vault::rotate_keys`] pass that re-wraps this
    /// entry, so a caller can tell a stale entry from a freshly rotated one.
    pub key_version: u32,
}

/// Snapshot returned by [`Vault::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultStats {
    pub entry_count: u64,
    pub audit_log_size: u64,
    pub current_key_version: u32,
    pub last_rotation_at: Option<i64>,
}

/// An opaque, serialized vault backup. Produced by [`Vault::backup`] and
/// consumed by [`Vault::restore`]; never deserialized except through those
/// two operations, so its internal shape is implementation-defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultBackup {
    pub data: String,
    pub created_at: i64,
    pub entry_count: u64,
}

#[async_trait]
pub trait Vault: Send + Sync {
    async fn store(&self, key: &str, value: &str, metadata: Option<serde_json::Value>) -> Result<(), StorageError>;

    async fn retrieve(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    async fn list_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Re-wraps every entry under a freshly generated vault key, leaving the
    /// outer master-key layer untouched. Atomic with respect to readers: a
    /// concurrent [`Vault::retrieve`] either sees the old or the new wrapping,
    /// never a half-rotated entry.
    async fn rotate_keys(&self) -> Result<u64, StorageError>;

    async fn audit_log(&self) -> Result<Vec<VaultAuditEntry>, StorageError>;

    async fn backup(&self) -> Result<VaultBackup, StorageError>;

    async fn restore(&self, backup: &VaultBackup) -> Result<u64, StorageError>;

    async fn stats(&self) -> Result<VaultStats, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_entry_round_trips_through_json() {
        let entry = VaultAuditEntry {
            key: "api-token".into(),
            action: VaultAction::Store,
            timestamp: 1_700_000_000,
            success: true,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: VaultAuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key, entry.key);
        assert_eq!(back.action, VaultAction::Store);
    }
}
