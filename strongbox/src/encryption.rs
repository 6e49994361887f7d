// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encryption Service Implementation
//!
//! Concrete implementation of [`EncryptionService`]: Argon2id key derivation
//! and AES-256-GCM / ChaCha20-Poly1305 authenticated encryption, both using
//! 12-byte nonces.
//!
//! ## Security Notes
//!
//! - Nonces are generated fresh per call via [`SystemRandom`] and are never
//!   reused for a given key.
//! - Derived keys are cached by `(passphrase, salt)` for the process
//!   lifetime, since Argon2id is deliberately slow and callers may need the
//!   same key repeatedly within one session.
//! - [`KeyMaterial`] zeroizes its key bytes on drop; nothing in this module
//!   copies key bytes into a structure that outlives the `KeyMaterial` it
//!   came from.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{AeadInPlace, Aes256Gcm, Key as AesKey, KeyInit as AesKeyInit, Nonce as AesNonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, KeyInit as ChaChaKeyInit, Nonce as ChaChaNonce};
use ring::rand::{SecureRandom, SystemRandom};

use strongbox_domain::encrypted_data::{looks_like_encrypted_data, EncryptedData, EncryptionAlgorithm, KeyMaterial};
use strongbox_domain::encryption::{Argon2Params, EncryptionBenchmark, EncryptionService, PassphraseStrength};
use strongbox_domain::error::StorageError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Concrete implementation of the encryption service.
pub struct MultiAlgoEncryption {
    rng: SystemRandom,
    params: Argon2Params,
    key_cache: Mutex<HashMap<(String, Vec<u8>), Vec<u8>>>,
}

impl Default for MultiAlgoEncryption {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiAlgoEncryption {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            params: Argon2Params::default(),
            key_cache: Mutex::new(HashMap::new()),
        }
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>, StorageError> {
        let mut buf = vec![0u8; len];
        self.rng
            .fill(&mut buf)
            .map_err(|e| StorageError::KeyDerivationFailed(format!("rng failure: {e:?}")))?;
        Ok(buf)
    }

    fn argon2(&self) -> Result<Argon2<'static>, StorageError> {
        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(self.params.output_len),
        )
        .map_err(|e| StorageError::KeyDerivationFailed(format!("invalid argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn encrypt_aes256_gcm(&self, plaintext: &[u8], key: &[u8]) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), StorageError> {
        if key.len() != KEY_LEN {
            return Err(StorageError::InvalidAlgorithm("AES-256-GCM requires a 32-byte key".into()));
        }
        let nonce_bytes = self.random_bytes(NONCE_LEN)?;
        let cipher = Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(key));
        let nonce = AesNonce::from_slice(&nonce_bytes);
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|e| StorageError::EncryptionFailed(format!("aes-256-gcm: {e}")))?;
        Ok((buffer, nonce_bytes, tag.to_vec()))
    }

    fn decrypt_aes256_gcm(&self, ciphertext: &[u8], key: &[u8], nonce: &[u8], tag: &[u8]) -> Result<Vec<u8>, StorageError> {
        if key.len() != KEY_LEN {
            return Err(StorageError::InvalidAlgorithm("AES-256-GCM requires a 32-byte key".into()));
        }
        let cipher = Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(key));
        let nonce = AesNonce::from_slice(nonce);
        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, GenericArray::from_slice(tag))
            .map_err(|_| StorageError::AuthenticationFailed("aes-256-gcm tag mismatch".into()))?;
        Ok(buffer)
    }

    fn encrypt_chacha20(&self, plaintext: &[u8], key: &[u8]) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), StorageError> {
        if key.len() != KEY_LEN {
            return Err(StorageError::InvalidAlgorithm(
                "ChaCha20-Poly1305 requires a 32-byte key".into(),
            ));
        }
        let nonce_bytes = self.random_bytes(NONCE_LEN)?;
        let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key));
        let nonce = ChaChaNonce::from_slice(&nonce_bytes);
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|e| StorageError::EncryptionFailed(format!("chacha20-poly1305: {e}")))?;
        Ok((buffer, nonce_bytes, tag.to_vec()))
    }

    fn decrypt_chacha20(&self, ciphertext: &[u8], key: &[u8], nonce: &[u8], tag: &[u8]) -> Result<Vec<u8>, StorageError> {
        if key.len() != KEY_LEN {
            return Err(StorageError::InvalidAlgorithm(
                "ChaCha20-Poly1305 requires a 32-byte key".into(),
            ));
        }
        let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key));
        let nonce = ChaChaNonce::from_slice(nonce);
        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, GenericArray::from_slice(tag))
            .map_err(|_| StorageError::AuthenticationFailed("chacha20-poly1305 tag mismatch".into()))?;
        Ok(buffer)
    }

    fn encrypt_with(
        &self,
        plaintext: &[u8],
        key: &[u8],
        algorithm: EncryptionAlgorithm,
    ) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), StorageError> {
        match algorithm {
            EncryptionAlgorithm::Aes256Gcm => self.encrypt_aes256_gcm(plaintext, key),
            EncryptionAlgorithm::ChaCha20Poly1305 => self.encrypt_chacha20(plaintext, key),
        }
    }

    fn resolve_field<'a>(value: &'a mut serde_json::Value, path: &str) -> Option<&'a mut serde_json::Value> {
        let mut current = value;
        for segment in path.split('.') {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        Some(current)
    }
}

impl EncryptionService for MultiAlgoEncryption {
    fn derive_key(&self, passphrase: &str, salt: Option<&[u8]>) -> Result<KeyMaterial, StorageError> {
        let salt = match salt {
            Some(s) => s.to_vec(),
            None => self.random_bytes(self.params.output_len)?,
        };

        let cache_key = (passphrase.to_string(), salt.clone());
        if let Some(cached) = self.key_cache.lock().unwrap().get(&cache_key) {
            return Ok(KeyMaterial::new(cached.clone(), salt));
        }

        let argon2 = self.argon2()?;
        let mut out = vec![0u8; self.params.output_len];
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt, &mut out)
            .map_err(|e| StorageError::KeyDerivationFailed(format!("argon2id: {e}")))?;

        self.key_cache.lock().unwrap().insert(cache_key, out.clone());
        Ok(KeyMaterial::new(out, salt))
    }

    fn generate_key(&self) -> Result<KeyMaterial, StorageError> {
        let key = self.random_bytes(KEY_LEN)?;
        let salt = self.random_bytes(self.params.output_len)?;
        Ok(KeyMaterial::new(key, salt))
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        key: &KeyMaterial,
        algorithm: EncryptionAlgorithm,
    ) -> Result<EncryptedData, StorageError> {
        let (ciphertext, nonce, tag) = self.encrypt_with(plaintext, &key.key, algorithm)?;
        Ok(EncryptedData::new(
            BASE64.encode(ciphertext),
            BASE64.encode(nonce),
            BASE64.encode(tag),
            algorithm,
            plaintext.len() as u64,
        ))
    }

    fn decrypt(&self, envelope: &EncryptedData, key: &KeyMaterial) -> Result<Vec<u8>, StorageError> {
        let ciphertext = BASE64
            .decode(&envelope.data)
            .map_err(|e| StorageError::DecryptionFailed(format!("invalid base64 data: {e}")))?;
        let nonce = BASE64
            .decode(&envelope.iv)
            .map_err(|e| StorageError::DecryptionFailed(format!("invalid base64 iv: {e}")))?;
        let tag = BASE64
            .decode(&envelope.auth_tag)
            .map_err(|e| StorageError::DecryptionFailed(format!("invalid base64 tag: {e}")))?;

        match envelope.algorithm {
            EncryptionAlgorithm::Aes256Gcm => self.decrypt_aes256_gcm(&ciphertext, &key.key, &nonce, &tag),
            EncryptionAlgorithm::ChaCha20Poly1305 => self.decrypt_chacha20(&ciphertext, &key.key, &nonce, &tag),
        }
    }

    fn encrypt_fields(
        &self,
        value: &mut serde_json::Value,
        paths: &[String],
        key: &KeyMaterial,
        algorithm: EncryptionAlgorithm,
    ) -> Result<(), StorageError> {
        for path in paths {
            let Some(field) = Self::resolve_field(value, path) else {
                continue;
            };
            let plaintext = serde_json::to_vec(field)?;
            let envelope = self.encrypt(&plaintext, key, algorithm)?;
            *field = serde_json::to_value(envelope)?;
        }
        Ok(())
    }

    fn decrypt_fields(
        &self,
        value: &mut serde_json::Value,
        paths: &[String],
        key: &KeyMaterial,
    ) -> Result<(), StorageError> {
        for path in paths {
            let Some(field) = Self::resolve_field(value, path) else {
                continue;
            };
            if !looks_like_encrypted_data(field) {
                continue;
            }
            let envelope: EncryptedData = serde_json::from_value(field.clone())?;
            let plaintext = self.decrypt(&envelope, key)?;
            *field = serde_json::from_slice(&plaintext)?;
        }
        Ok(())
    }

    fn analyze_passphrase(&self, passphrase: &str) -> PassphraseStrength {
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let len = passphrase.chars().count();
        let mut score: i64 = 0;

        if len < 12 {
            issues.push("Too short".to_string());
            recommendations.push("use at least 12 characters".to_string());
        } else {
            score += 20;
            if len >= 20 {
                score += 30;
            }
        }

        let has_lower = passphrase.chars().any(|c| c.is_lowercase());
        let has_upper = passphrase.chars().any(|c| c.is_uppercase());
        let has_digit = passphrase.chars().any(|c| c.is_ascii_digit());
        let has_symbol = passphrase.chars().any(|c| !c.is_alphanumeric());
        if has_lower {
            score += 10;
        }
        if has_upper {
            score += 10;
        }
        if has_digit {
            score += 10;
        }
        if has_symbol {
            score += 15;
        }
        if !(has_lower && has_upper && has_digit && has_symbol) {
            recommendations.push("mix uppercase, lowercase, digits, and symbols".to_string());
        }

        let chars: Vec<char> = passphrase.chars().collect();
        let has_run = chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]);
        if has_run {
            score -= 10;
            issues.push("contains a run of 3 or more repeated characters".to_string());
            recommendations.push("avoid repeating the same character three or more times in a row".to_string());
        }

        let charset_size: f64 = [(has_lower, 26.0), (has_upper, 26.0), (has_digit, 10.0), (has_symbol, 32.0)]
            .into_iter()
            .filter(|(present, _)| *present)
            .map(|(_, size)| size)
            .sum();
        let entropy_estimate = if charset_size > 0.0 { charset_size.log2() * len as f64 } else { 0.0 };
        if entropy_estimate >= 80.0 {
            score += 25;
        } else if entropy_estimate >= 40.0 {
            score += 15;
        }

        PassphraseStrength {
            score: score.clamp(0, 100) as u8,
            issues,
            recommendations,
        }
    }

    fn benchmark(&self, algorithm: EncryptionAlgorithm, sample: &[u8]) -> Result<EncryptionBenchmark, StorageError> {
        let key = self.generate_key()?;
        let start = Instant::now();
        let envelope = self.encrypt(sample, &key, algorithm)?;
        let _ = self.decrypt(&envelope, &key)?;
        let elapsed = start.elapsed();
        let mb = sample.len() as f64 / (1024.0 * 1024.0);
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            mb / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Ok(EncryptionBenchmark {
            algorithm,
            time: elapsed,
            throughput_mb_per_sec: throughput,
        })
    }

    fn supported_algorithms(&self) -> Vec<EncryptionAlgorithm> {
        vec![EncryptionAlgorithm::Aes256Gcm, EncryptionAlgorithm::ChaCha20Poly1305]
    }
}
