// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `EncryptedData` wire envelope and the AEAD algorithms it can name.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Authenticated-encryption algorithms supported by the encryption service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionAlgorithm {
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Default for EncryptionAlgorithm {
    fn default() -> Self {
        Self::Aes256Gcm
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncryptionAlgorithm::Aes256Gcm => "aes-256-gcm",
            EncryptionAlgorithm::ChaCha20Poly1305 => "chacha20-poly1305",
        };
        f.write_str(s)
    }
}

/// Wire form of an AEAD-encrypted value.
///
/// `iv` holds a 12-byte nonce (the field keeps its historical name from the
/// external interface, not its historical length). `compressed` is always
/// `false` here: compression happens before encryption in the pipeline, so
/// the plaintext this envelope wraps is never itself something this struct
/// needs to further decompress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedData {
    pub data: String,
    pub iv: String,
    pub auth_tag: String,
    pub algorithm: EncryptionAlgorithm,
    pub compressed: bool,
    pub original_size: u64,
}

impl EncryptedData {
    pub fn new(
        data: String,
        iv: String,
        auth_tag: String,
        algorithm: EncryptionAlgorithm,
        original_size: u64,
    ) -> Self {
        Self {
            data,
            iv,
            auth_tag,
            algorithm,
            compressed: false,
            original_size,
        }
    }
}

/// Key material derived for or generated by the encryption service.
///
/// Zeroed on drop so a forgotten reference to derived key bytes never
/// lingers in memory past the value's lifetime.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct KeyMaterial {
    pub key: Vec<u8>,
    #[zeroize(skip)]
    pub salt: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(key: Vec<u8>, salt: Vec<u8>) -> Self {
        Self { key, salt }
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"<redacted>")
            .field("salt_len", &self.salt.len())
            .finish()
    }
}

/// Structural check matching the external interface's definition of "this
/// JSON value looks like an `EncryptedData` envelope": an object carrying
/// all four required string fields.
pub fn looks_like_encrypted_data(value: &serde_json::Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    ["data", "iv", "authTag", "algorithm"]
        .iter()
        .all(|field| obj.get(*field).is_some_and(|v| v.is_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_envelope_shape() {
        let env = EncryptedData::new(
            "ZGF0YQ==".into(),
            "aXY=".into(),
            "dGFn".into(),
            EncryptionAlgorithm::Aes256Gcm,
            4,
        );
        let json = serde_json::to_value(&env).unwrap();
        assert!(looks_like_encrypted_data(&json));
    }

    #[test]
    fn rejects_plain_objects() {
        let json = serde_json::json!({"name": "Alice"});
        assert!(!looks_like_encrypted_data(&json));
    }
}
