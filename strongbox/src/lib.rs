// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Strongbox
//!
//! A local, embeddable, encrypted key-value storage engine. Every value
//! passes through the same pipeline regardless of backend: serialize,
//! optionally compress, optionally encrypt, then persist.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               StorageManager                 │  namespaces, lifecycle,
//! │                                                │  migrations, vault
//! └───────────────────────┬────────────────────────┘
//! ┌───────────────────────┴────────────────────────┐
//! │                 QueryBuilder                   │  filter / sort /
//! │                                                  │  paginate / aggregate
//! └───────────────────────┬────────────────────────┘
//! ┌───────────────────────┴────────────────────────┐
//! │                PipelineAdapter<R>               │  serialize → compress
//! │  (generic over any RawStorage backend)          │  → encrypt → persist
//! └──────────┬──────────────────────────┬───────────┘
//! ┌──────────┴──────────┐   ┌───────────┴───────────┐
//! │    MemoryStorage     │   │       SqlStorage       │
//! │  (process-lifetime)  │   │  (sqlx / SQLite, WAL)  │
//! └──────────────────────┘   └────────────────────────┘
//! ```
//!
//! ## Core components
//!
//! - [`adapters`]: [`adapters::RawStorage`](strongbox_domain::adapter::RawStorage)
//!   backends (`MemoryStorage`, `SqlStorage`) and the generic
//!   [`adapters::PipelineAdapter`] that wraps either into a full
//!   [`strongbox_domain::adapter::StorageAdapter`].
//! - [`cache`]: LRU-with-TTL read-through cache sitting in front of an adapter.
//! - [`compression`]: gzip/deflate/Brotli/LZ4 with entropy-based
//!   decide-and-compress policy.
//! - [`encryption`]: Argon2id key derivation and AES-256-GCM /
//!   ChaCha20-Poly1305 authenticated encryption.
//! - [`migration`]: dependency-ordered schema/data migrations.
//! - [`manager`]: the [`manager::StorageManager`] façade tying the above
//!   together behind namespaces.
//! - [`query`]: a fluent [`query::QueryBuilder`] executed in memory against
//!   any adapter.
//! - [`vault`]: [`vault::SealedVault`], a double-wrapped secret store.
//!
//! ## Security
//!
//! - Argon2id key derivation (64 MiB, 3 passes, 4-way parallelism).
//! - AEAD encryption with per-record nonces; tampered ciphertext fails
//!   authentication rather than returning corrupted plaintext.
//! - Key material is zeroized on drop.
//! - The vault layers a second, independently-keyed encryption pass on top of
//!   the storage-level one, so compromising the backing adapter alone (without
//!   the vault passphrase) discloses nothing.

pub mod adapters;
pub mod cache;
pub mod compression;
pub mod encryption;
pub mod manager;
pub mod migration;
pub mod query;
pub mod vault;

pub use adapters::{MemoryStorage, PipelineAdapter, SqlStorage, SqlStorageStats};
pub use cache::{Cache, CacheStats};
pub use compression::MultiAlgoCompression;
pub use encryption::MultiAlgoEncryption;
pub use manager::{HealthReport, Namespace, StorageManager};
pub use migration::MigrationManager;
pub use query::QueryBuilder;
pub use vault::SealedVault;

pub use strongbox_domain::adapter::{RawStorage, StorageAdapter};
pub use strongbox_domain::config::{
    AdapterKind, CacheConfig, CompressionAlgorithmChoice, CompressionConfig, EncryptionConfig, MigrationsConfig,
    StorageConfig, VaultConfig,
};
pub use strongbox_domain::encrypted_data::{EncryptedData, EncryptionAlgorithm, KeyMaterial};
pub use strongbox_domain::error::StorageError;
pub use strongbox_domain::key::StorageKey;
pub use strongbox_domain::metadata::{CompressionAlgorithm, RecordMetadata};
pub use strongbox_domain::migration::{Migration, MigrationHistoryEntry, MigrationRunResult};
pub use strongbox_domain::query::{
    AggregateClause, AggregateKind, JoinClause, JoinType, LogicalOperator, OrderClause, OrderDirection, QueryCondition,
    QueryOperator, QueryPlan, QueryResult,
};
pub use strongbox_domain::vault::{Vault, VaultAction, VaultAuditEntry, VaultBackup, VaultSecret, VaultStats};
