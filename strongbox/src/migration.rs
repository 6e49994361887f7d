// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Migration Manager
//!
//! Applies registered [`Migration`]s in dependency order (a topological sort
//! over [`Migration::dependencies`], ties broken by ascending version), and
//! persists what has run under the reserved key `__migrations__` so restarts
//! pick up where they left off.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use strongbox_domain::adapter::StorageAdapter;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::migration::{compare_versions, Migration, MigrationHistoryEntry, MigrationRunResult};

pub const MIGRATIONS_KEY: &str = "__migrations__";

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct MigrationManager {
    adapter: Arc<dyn StorageAdapter>,
    migrations: Vec<Arc<dyn Migration>>,
}

impl MigrationManager {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self {
            adapter,
            migrations: Vec::new(),
        }
    }

    pub fn register(&mut self, migration: Arc<dyn Migration>) {
        self.migrations.push(migration);
    }

    pub async fn history(&self) -> Result<Vec<MigrationHistoryEntry>, StorageError> {
        let key = StorageKey::new(MIGRATIONS_KEY)?;
        match self.adapter.get(&key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_history(&self, history: &[MigrationHistoryEntry]) -> Result<(), StorageError> {
        let key = StorageKey::new(MIGRATIONS_KEY)?;
        self.adapter.set(&key, serde_json::to_value(history)?).await
    }

    /// Kahn's algorithm over [`Migration::dependencies`]; a missing
    /// dependency (one not registered) is treated as already satisfied, a
    /// cycle is a [`StorageError::MigrationError`].
    fn topological_order(&self) -> Result<Vec<Arc<dyn Migration>>, StorageError> {
        let by_version: HashMap<&str, &Arc<dyn Migration>> =
            self.migrations.iter().map(|m| (m.version(), m)).collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for m in &self.migrations {
            let deps = m.dependencies().iter().filter(|d| by_version.contains_key(d.as_str())).count();
            in_degree.insert(m.version(), deps);
        }

        let mut ready_sorted: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&v, _)| v)
            .collect();
        ready_sorted.sort_by(|a, b| compare_versions(a, b));
        let mut queue: VecDeque<&str> = ready_sorted.into();

        let mut ordered = Vec::with_capacity(self.migrations.len());
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(version) = queue.pop_front() {
            if !visited.insert(version) {
                continue;
            }
            ordered.push((*by_version[version]).clone());

            let mut newly_ready = Vec::new();
            for m in &self.migrations {
                if visited.contains(m.version()) {
                    continue;
                }
                let deps: Vec<&str> = m
                    .dependencies()
                    .iter()
                    .map(String::as_str)
                    .filter(|d| by_version.contains_key(d))
                    .collect();
                if deps.iter().all(|d| visited.contains(d)) {
                    newly_ready.push(m.version());
                }
            }
            newly_ready.sort_by(|a, b| compare_versions(a, b));
            for v in newly_ready {
                if !queue.contains(&v) {
                    queue.push_back(v);
                }
            }
        }

        if ordered.len() != self.migrations.len() {
            return Err(StorageError::migration_error(
                "dependency cycle detected among registered migrations",
            ));
        }

        Ok(ordered)
    }

    /// Applies every pending migration in dependency order, stopping (and
    /// returning what ran so far) at the first failure.
    pub async fn migrate(&self) -> Result<Vec<MigrationRunResult>, StorageError> {
        let mut history = self.history().await?;
        let applied: HashSet<String> = history.iter().map(|e| e.version.clone()).collect();
        let ordered = self.topological_order()?;

        let mut results = Vec::new();
        for migration in ordered {
            if applied.contains(migration.version()) {
                continue;
            }

            let start = Instant::now();
            let outcome = migration.up(self.adapter.clone()).await;
            let execution_time_ms = start.elapsed().as_millis() as u64;
            let executed_at = now_ms();

            match outcome {
                Ok(()) => {
                    history.push(MigrationHistoryEntry {
                        version: migration.version().to_string(),
                        description: migration.description().to_string(),
                        applied_at: executed_at,
                        execution_time_ms,
                    });
                    self.save_history(&history).await?;
                    results.push(MigrationRunResult {
                        version: migration.version().to_string(),
                        success: true,
                        execution_time_ms,
                        error: None,
                        executed_at,
                    });
                }
                Err(e) => {
                    results.push(MigrationRunResult {
                        version: migration.version().to_string(),
                        success: false,
                        execution_time_ms,
                        error: Some(e.to_string()),
                        executed_at,
                    });
                    break;
                }
            }
        }

        Ok(results)
    }

    /// Rolls back applied migrations, most-recent-first, until
    /// `target_version` (exclusive) is reached. `None` rolls back just the
    /// most recently applied migration.
    pub async fn rollback(&self, target_version: Option<&str>) -> Result<Vec<MigrationRunResult>, StorageError> {
        let mut history = self.history().await?;
        history.sort_by(|a, b| compare_versions(&a.version, &b.version));

        let by_version: HashMap<&str, &Arc<dyn Migration>> =
            self.migrations.iter().map(|m| (m.version(), m)).collect();

        let mut results = Vec::new();
        while let Some(entry) = history.last().cloned() {
            if let Some(target) = target_version {
                if compare_versions(&entry.version, target) != std::cmp::Ordering::Greater {
                    break;
                }
            }

            let Some(migration) = by_version.get(entry.version.as_str()) else {
                return Err(StorageError::migration_error(format!(
                    "migration {} is in history but no longer registered",
                    entry.version
                )));
            };

            if !migration.reversible() {
                return Err(StorageError::migration_error(format!(
                    "migration {} is not reversible",
                    entry.version
                )));
            }

            let start = Instant::now();
            let outcome = migration.down(self.adapter.clone()).await;
            let execution_time_ms = start.elapsed().as_millis() as u64;
            let executed_at = now_ms();

            match outcome {
                Ok(()) => {
                    history.pop();
                    self.save_history(&history).await?;
                    results.push(MigrationRunResult {
                        version: entry.version,
                        success: true,
                        execution_time_ms,
                        error: None,
                        executed_at,
                    });
                }
                Err(e) => {
                    results.push(MigrationRunResult {
                        version: entry.version,
                        success: false,
                        execution_time_ms,
                        error: Some(e.to_string()),
                        executed_at,
                    });
                    break;
                }
            }

            if target_version.is_none() {
                break;
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStorage, PipelineAdapter};
    use crate::compression::MultiAlgoCompression;
    use crate::encryption::MultiAlgoEncryption;
    use async_trait::async_trait;
    use strongbox_domain::config::StorageConfig;

    struct NoopMigration {
        version: &'static str,
        deps: Vec<String>,
    }

    #[async_trait]
    impl Migration for NoopMigration {
        fn version(&self) -> &str {
            self.version
        }

        fn description(&self) -> &str {
            "noop"
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }

        async fn up(&self, adapter: Arc<dyn StorageAdapter>) -> Result<(), StorageError> {
            let key = StorageKey::new(format!("migrations:marker:{}", self.version))?;
            adapter.set(&key, serde_json::json!(true)).await
        }

        async fn down(&self, adapter: Arc<dyn StorageAdapter>) -> Result<(), StorageError> {
            let key = StorageKey::new(format!("migrations:marker:{}", self.version))?;
            adapter.delete(&key).await?;
            Ok(())
        }
    }

    fn adapter() -> Arc<dyn StorageAdapter> {
        Arc::new(
            PipelineAdapter::new(
                MemoryStorage::new(),
                StorageConfig::default(),
                Arc::new(MultiAlgoCompression::new()),
                Arc::new(MultiAlgoEncryption::new()),
                None,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn applies_migrations_in_dependency_order() {
        let adapter = adapter();
        let mut manager = MigrationManager::new(adapter.clone());
        manager.register(Arc::new(NoopMigration {
            version: "2.0.0",
            deps: vec!["1.0.0".to_string()],
        }));
        manager.register(Arc::new(NoopMigration {
            version: "1.0.0",
            deps: vec![],
        }));

        let results = manager.migrate().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].version, "1.0.0");
        assert_eq!(results[1].version, "2.0.0");
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn already_applied_migrations_are_skipped() {
        let adapter = adapter();
        let mut manager = MigrationManager::new(adapter.clone());
        manager.register(Arc::new(NoopMigration {
            version: "1.0.0",
            deps: vec![],
        }));
        manager.migrate().await.unwrap();
        let second_run = manager.migrate().await.unwrap();
        assert!(second_run.is_empty());
    }

    #[tokio::test]
    async fn rollback_undoes_most_recent_migration() {
        let adapter = adapter();
        let mut manager = MigrationManager::new(adapter.clone());
        manager.register(Arc::new(NoopMigration {
            version: "1.0.0",
            deps: vec![],
        }));
        manager.migrate().await.unwrap();
        let results = manager.rollback(None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert!(manager.history().await.unwrap().is_empty());
    }
}
