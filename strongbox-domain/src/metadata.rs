// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Record metadata tracked alongside every stored value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compression algorithms recognised by the storage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Gzip,
    Deflate,
    Lz4,
    Brotli,
    None,
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Deflate => "deflate",
            CompressionAlgorithm::Lz4 => "lz4",
            CompressionAlgorithm::Brotli => "brotli",
            CompressionAlgorithm::None => "none",
        };
        f.write_str(s)
    }
}

/// Metadata persisted next to every record.
///
/// Invariants (enforced by the pipeline that builds these, not by this
/// type): `encrypted` implies the stored value is an `EncryptedData`
/// envelope whose plaintext is the (possibly compressed) JSON bytes;
/// `compressed` implies the stored value is base64 of the chosen
/// algorithm's output and `compressed_size` is that output's length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub created_at: i64,
    pub updated_at: i64,
    pub accessed_at: i64,
    pub access_count: u64,
    pub original_size: u64,
    pub compressed: bool,
    pub compression_algorithm: CompressionAlgorithm,
    pub compressed_size: u64,
    pub encrypted: bool,
}

impl RecordMetadata {
    /// Metadata for a freshly-written, uncompressed, unencrypted record.
    pub fn new(now_ms: i64, original_size: u64) -> Self {
        Self {
            created_at: now_ms,
            updated_at: now_ms,
            accessed_at: now_ms,
            access_count: 0,
            original_size,
            compressed: false,
            compression_algorithm: CompressionAlgorithm::None,
            compressed_size: original_size,
            encrypted: false,
        }
    }

    /// Records a read: bumps `accessed_at`/`access_count`. Per the pipeline's
    /// write-amplification trade-off, callers skip this when `encrypted` is
    /// true (it would otherwise trigger re-writes of ciphertext metadata on
    /// every read).
    pub fn record_access(&mut self, now_ms: i64) {
        self.accessed_at = now_ms;
        self.access_count += 1;
    }

    pub fn record_update(&mut self, now_ms: i64, original_size: u64) {
        self.updated_at = now_ms;
        self.original_size = original_size;
    }
}
