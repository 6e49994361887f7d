// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Migrations with a diamond dependency graph run in a valid topological
//! order, not registration order.

use std::sync::Arc;

use async_trait::async_trait;
use strongbox::adapters::MemoryStorage;
use strongbox::{Migration, MigrationManager, PipelineAdapter, StorageAdapter, StorageConfig, StorageError};

struct NamedMigration {
    version: &'static str,
    dependencies: Vec<String>,
}

#[async_trait]
impl Migration for NamedMigration {
    fn version(&self) -> &str {
        self.version
    }

    fn description(&self) -> &str {
        "test migration"
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    async fn up(&self, _adapter: Arc<dyn StorageAdapter>) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test]
async fn diamond_dependencies_resolve_to_a_valid_topological_order() {
    let config = StorageConfig::default();
    let adapter: Arc<dyn StorageAdapter> = Arc::new(
        PipelineAdapter::new(
            MemoryStorage::new(),
            config.clone(),
            Arc::new(strongbox::MultiAlgoCompression::new()),
            Arc::new(strongbox::MultiAlgoEncryption::new()),
            None,
        )
        .unwrap(),
    );
    adapter.initialize().await.unwrap();

    let mut manager = MigrationManager::new(adapter);
    manager.register(Arc::new(NamedMigration {
        version: "3.0.0",
        dependencies: vec!["2.0.0".to_string(), "2.1.0".to_string()],
    }));
    manager.register(Arc::new(NamedMigration {
        version: "1.0.0",
        dependencies: vec![],
    }));
    manager.register(Arc::new(NamedMigration {
        version: "2.1.0",
        dependencies: vec!["1.0.0".to_string()],
    }));
    manager.register(Arc::new(NamedMigration {
        version: "2.0.0",
        dependencies: vec!["1.0.0".to_string()],
    }));

    let results = manager.migrate().await.unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.success));

    let index_of = |v: &str| results.iter().position(|r| r.version == v).unwrap();

    assert_eq!(index_of("1.0.0"), 0);
    assert_eq!(index_of("3.0.0"), 3);
    assert!(index_of("2.0.0") < index_of("3.0.0"));
    assert!(index_of("2.1.0") < index_of("3.0.0"));
}

#[tokio::test]
async fn a_cycle_is_rejected_before_any_migration_runs() {
    let config = StorageConfig::default();
    let adapter: Arc<dyn StorageAdapter> = Arc::new(
        PipelineAdapter::new(
            MemoryStorage::new(),
            config,
            Arc::new(strongbox::MultiAlgoCompression::new()),
            Arc::new(strongbox::MultiAlgoEncryption::new()),
            None,
        )
        .unwrap(),
    );
    adapter.initialize().await.unwrap();

    let mut manager = MigrationManager::new(adapter);
    manager.register(Arc::new(NamedMigration {
        version: "1.0.0",
        dependencies: vec!["2.0.0".to_string()],
    }));
    manager.register(Arc::new(NamedMigration {
        version: "2.0.0",
        dependencies: vec!["1.0.0".to_string()],
    }));

    assert!(matches!(manager.migrate().await, Err(StorageError::MigrationError(_))));
}
