// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Storage keys: validated, namespace-aware strings of the form
//! `"namespace:rest"`.

use crate::error::StorageError;

/// Maximum length, in bytes, of a stored key.
pub const MAX_KEY_LENGTH: usize = 250;

/// Namespace used when a key carries no explicit `:` separator.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A validated storage key.
///
/// Keys are non-empty UTF-8 strings of at most [`MAX_KEY_LENGTH`] bytes.
/// They are conventionally written as `"namespace:rest"`; a key without a
/// colon belongs to [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Validates and wraps a raw key string.
    pub fn new(raw: impl Into<String>) -> Result<Self, StorageError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(StorageError::invalid_key("key must not be empty"));
        }
        if raw.len() > MAX_KEY_LENGTH {
            return Err(StorageError::invalid_key(format!(
                "key exceeds {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The namespace segment: everything before the first `:`, or
    /// [`DEFAULT_NAMESPACE`] if there is none.
    pub fn namespace(&self) -> &str {
        match self.0.split_once(':') {
            Some((ns, _)) => ns,
            None => DEFAULT_NAMESPACE,
        }
    }

    /// The portion of the key after the namespace's `:`, or the whole key
    /// when it carries no namespace.
    pub fn local_part(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }

    /// Builds the namespace-prefix form (`"{namespace}:"`) used for prefix
    /// scans in `list`/`count`/`has`. Always carries the trailing colon so a
    /// namespace never matches another namespace sharing its leading
    /// substring (e.g. `users` vs. `users2`).
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{namespace}:")
    }

    /// Builds a fully-qualified key from a namespace and a local key.
    pub fn namespaced(namespace: &str, key: &str) -> Result<Self, StorageError> {
        Self::new(format!("{namespace}:{key}"))
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_keys() {
        assert!(StorageKey::new("").is_err());
        assert!(StorageKey::new("a".repeat(MAX_KEY_LENGTH + 1)).is_err());
        assert!(StorageKey::new("a".repeat(MAX_KEY_LENGTH)).is_ok());
    }

    #[test]
    fn namespace_defaults_without_colon() {
        let k = StorageKey::new("no-namespace-here").unwrap();
        assert_eq!(k.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(k.local_part(), "no-namespace-here");
    }

    #[test]
    fn namespace_splits_on_first_colon() {
        let k = StorageKey::new("users:1:profile").unwrap();
        assert_eq!(k.namespace(), "users");
        assert_eq!(k.local_part(), "1:profile");
    }

    #[test]
    fn namespace_prefix_is_distinct_across_similar_namespaces() {
        let users_prefix = StorageKey::namespace_prefix("users");
        let k = StorageKey::new("users2:1").unwrap();
        assert!(!k.as_str().starts_with(&users_prefix));
    }
}
