// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration Loading
//!
//! Loads a [`StorageConfig`] from a TOML file at process start, the way the
//! rest of this workspace expects configuration to arrive: the bootstrap
//! layer resolves *where* configuration lives, the engine crate only ever
//! sees the already-parsed [`StorageConfig`] tree.
//!
//! ## Resolution order
//!
//! 1. An explicit path passed on the command line (`--config`).
//! 2. `strongbox.toml` in the current directory, then each parent directory
//!    up to the filesystem root (mirrors how `.gitignore`/`Cargo.toml`
//!    discovery works, so a config file dropped anywhere above the working
//!    directory is picked up without an env var).
//! 3. [`StorageConfig::default`], with a `tracing::warn!` so a missing config
//!    file is visible in logs instead of silently producing an in-memory,
//!    unencrypted store.

use std::path::{Path, PathBuf};

use strongbox_domain::config::StorageConfig;
use strongbox_domain::error::StorageError;

/// Default file name searched for during upward directory discovery.
pub const CONFIG_FILE_NAME: &str = "strongbox.toml";

/// Load configuration, searching explicit path, then upward directory scan,
/// then falling back to defaults.
///
/// # Errors
///
/// Returns [`StorageError::Initialization`] if an explicit path was given but
/// could not be read, or if a discovered file's contents fail to parse as
/// TOML. A *missing* file when no explicit path was given is not an error —
/// it falls back to [`StorageConfig::default`].
pub fn load_config(explicit_path: Option<&Path>) -> Result<StorageConfig, StorageError> {
    if let Some(path) = explicit_path {
        return load_from_file(path);
    }

    match find_config_upward(&std::env::current_dir().map_err(|e| StorageError::initialization(e.to_string()))?) {
        Some(found) => load_from_file(&found),
        None => {
            tracing::warn!(
                "no {} found in the current directory or its parents; using default configuration (in-memory, unencrypted)",
                CONFIG_FILE_NAME
            );
            Ok(StorageConfig::default())
        }
    }
}

fn load_from_file(path: &Path) -> Result<StorageConfig, StorageError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| StorageError::initialization(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&contents).map_err(|e| StorageError::initialization(format!("failed to parse {}: {e}", path.display())))
}

/// Search `start` and each of its ancestors for [`CONFIG_FILE_NAME`].
fn find_config_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/strongbox.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_path_parses_a_minimal_config() {
        let dir = std::env::temp_dir().join(format!("strongbox-bootstrap-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("strongbox.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            type = "memory"
            name = "test-store"

            [encryption]
            enabled = false
            algorithm = "aes-256-gcm"

            [compression]
            enabled = false
            algorithm = "auto"
            min_size = 1024
            level = 6

            [cache]
            max_items = 100
            max_size_bytes = 1048576
            ttl_ms = 60000
            enable_stats = true

            [migrations]
            auto_migrate = true
            "#
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.name, "test-store");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn finds_config_in_a_parent_directory() {
        let root = std::env::temp_dir().join(format!("strongbox-bootstrap-upward-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "type = \"memory\"\nname = \"root-store\"\n").unwrap();

        let found = find_config_upward(&nested);
        assert_eq!(found, Some(root.join(CONFIG_FILE_NAME)));

        std::fs::remove_dir_all(&root).ok();
    }
}
