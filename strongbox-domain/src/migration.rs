// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Schema Migration Contract
//!
//! Types shared between the domain's migration trait and the engine's
//! topologically-sorted [`crate::migration`] manager implementation.

use crate::adapter::StorageAdapter;
use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single versioned schema change.
///
/// `version` is compared segment-wise (`"2.1.0" > "2.0.0"`, missing
/// segments treated as `0`), not lexicographically.
#[async_trait]
pub trait Migration: Send + Sync {
    fn version(&self) -> &str;

    fn description(&self) -> &str;

    /// Versions that must be applied before this one. Used to topologically
    /// order pending migrations; a cycle is an error before any `up` runs.
    fn dependencies(&self) -> &[String] {
        &[]
    }

    /// Whether [`Migration::down`] is implemented; `rollback` refuses to
    /// proceed through a migration that returns `false` here.
    fn reversible(&self) -> bool {
        true
    }

    async fn up(&self, adapter: Arc<dyn StorageAdapter>) -> Result<(), StorageError>;

    async fn down(&self, adapter: Arc<dyn StorageAdapter>) -> Result<(), StorageError> {
        let _ = adapter;
        Err(StorageError::migration_error(format!(
            "migration {} is not reversible",
            self.version()
        )))
    }
}

/// One entry in the applied-migration history, persisted under the
/// reserved key `__migrations__`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationHistoryEntry {
    pub version: String,
    pub description: String,
    pub applied_at: i64,
    pub execution_time_ms: u64,
}

/// Result of running (or rolling back) a single migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRunResult {
    pub version: String,
    pub success: bool,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub executed_at: i64,
}

/// Compares two dotted version strings segment-wise, treating missing
/// trailing segments as zero (`"1.2" == "1.2.0"`).
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let mut a_parts = a.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    let mut b_parts = b.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    loop {
        let a_seg = a_parts.next();
        let b_seg = b_parts.next();
        match (a_seg, b_seg) {
            (None, None) => return std::cmp::Ordering::Equal,
            (a_seg, b_seg) => {
                let ord = a_seg.unwrap_or(0).cmp(&b_seg.unwrap_or(0));
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
