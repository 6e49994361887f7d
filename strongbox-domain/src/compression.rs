// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Service Contract
//!
//! Domain-level interface for the decide-and-compress policy: given a byte
//! buffer and a configuration, either produce compressed output worth
//! keeping or fall back to the identity transform. See [`CompressionConfig`]
//! in [`crate::config`] for the tunables and the engine crate's
//! `MultiAlgoCompression` for the concrete algorithm implementations.

use crate::config::CompressionConfig;
use crate::error::StorageError;
use crate::metadata::CompressionAlgorithm;
use std::time::Duration;

/// Guard ratio (compressed / original) above which compression output is
/// discarded and the record is stored uncompressed instead.
pub const COMPRESSION_EXPANSION_GUARD: f64 = 1.5;

/// Outcome of a decide-and-compress pass.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub data: Vec<u8>,
    pub compressed: bool,
    pub algorithm: CompressionAlgorithm,
    pub original_size: u64,
    pub compression_ratio: f64,
}

/// Entropy/size-based recommendation for whether compressing `data` is
/// worthwhile at all.
#[derive(Debug, Clone)]
pub struct CompressionAnalysis {
    pub entropy_bits_per_byte: f64,
    pub estimated_ratio: f64,
    pub recommended_algorithm: CompressionAlgorithm,
    pub should_compress: bool,
}

#[derive(Debug, Clone)]
pub struct CompressionBenchmark {
    pub algorithm: CompressionAlgorithm,
    pub time: Duration,
    pub ratio: f64,
    pub size: u64,
}

/// Domain service contract for compressing and decompressing stored values.
pub trait CompressionService: Send + Sync {
    /// Applies the decide-and-compress policy of §4.4: below `min_size`, or
    /// when the chosen algorithm's output exceeds
    /// [`COMPRESSION_EXPANSION_GUARD`] times the input, returns an identity
    /// outcome (`compressed = false`).
    fn compress(&self, data: &[u8], config: &CompressionConfig) -> Result<CompressionOutcome, StorageError>;

    /// Inverse of [`CompressionService::compress`]; `algorithm` and
    /// `compressed` normally come from the record's persisted metadata.
    fn decompress(
        &self,
        data: &[u8],
        algorithm: CompressionAlgorithm,
        compressed: bool,
    ) -> Result<Vec<u8>, StorageError>;

    fn analyze(&self, data: &[u8], config: &CompressionConfig) -> CompressionAnalysis;

    /// Compresses `sample` once with every algorithm this service supports
    /// and reports the time/ratio/size each one achieved, so callers can pick
    /// a default without guessing.
    fn benchmark(&self, sample: &[u8]) -> Result<Vec<CompressionBenchmark>, StorageError>;

    fn supported_algorithms(&self) -> Vec<CompressionAlgorithm>;
}
