// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Service Implementation
//!
//! Concrete implementation of [`CompressionService`], providing the
//! decide-and-compress policy on top of Gzip, Deflate, Brotli, and LZ4.
//!
//! ## Supported Algorithms
//!
//! - **Gzip** / **Deflate**: general-purpose, wide compatibility (flate2).
//! - **Brotli**: best ratio, used as the "auto" pick above 10 KiB.
//! - **LZ4**: fastest, used as the "auto" pick below 10 KiB.

use std::io::{Read, Write};
use std::time::Instant;

use flate2::read::{DeflateDecoder, DeflateEncoder, GzDecoder, GzEncoder};
use flate2::Compression as Flate2Level;

use strongbox_domain::compression::{
    CompressionAnalysis, CompressionBenchmark, CompressionOutcome, CompressionService,
    COMPRESSION_EXPANSION_GUARD,
};
use strongbox_domain::config::CompressionConfig;
use strongbox_domain::error::StorageError;
use strongbox_domain::metadata::CompressionAlgorithm;

/// Concrete implementation of the compression service.
///
/// Stateless and thread-safe: every operation only touches its arguments.
pub struct MultiAlgoCompression;

impl Default for MultiAlgoCompression {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiAlgoCompression {
    pub fn new() -> Self {
        Self
    }

    fn compress_gzip(&self, data: &[u8], level: i32) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        let mut encoder = GzEncoder::new(data, Flate2Level::new(level.clamp(0, 9) as u32));
        encoder
            .read_to_end(&mut output)
            .map_err(|e| StorageError::CompressionFailed(format!("gzip: {e}")))?;
        Ok(output)
    }

    fn decompress_gzip(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut output)
            .map_err(|e| StorageError::DecompressionFailed(format!("gzip: {e}")))?;
        Ok(output)
    }

    fn compress_deflate(&self, data: &[u8], level: i32) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        let mut encoder = DeflateEncoder::new(data, Flate2Level::new(level.clamp(0, 9) as u32));
        encoder
            .read_to_end(&mut output)
            .map_err(|e| StorageError::CompressionFailed(format!("deflate: {e}")))?;
        Ok(output)
    }

    fn decompress_deflate(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        DeflateDecoder::new(data)
            .read_to_end(&mut output)
            .map_err(|e| StorageError::DecompressionFailed(format!("deflate: {e}")))?;
        Ok(output)
    }

    fn compress_brotli(&self, data: &[u8], level: i32) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        let quality = level.clamp(0, 11) as u32;
        let mut writer = brotli::CompressorWriter::new(&mut output, 4096, quality, 22);
        writer
            .write_all(data)
            .map_err(|e| StorageError::CompressionFailed(format!("brotli: {e}")))?;
        writer
            .flush()
            .map_err(|e| StorageError::CompressionFailed(format!("brotli: {e}")))?;
        drop(writer);
        Ok(output)
    }

    fn decompress_brotli(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut output = Vec::new();
        brotli::Decompressor::new(data, 4096)
            .read_to_end(&mut output)
            .map_err(|e| StorageError::DecompressionFailed(format!("brotli: {e}")))?;
        Ok(output)
    }

    fn compress_lz4(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(lz4_flex::block::compress_prepend_size(data))
    }

    fn decompress_lz4(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        lz4_flex::block::decompress_size_prepended(data)
            .map_err(|e| StorageError::DecompressionFailed(format!("lz4: {e}")))
    }

    fn compress_with(&self, data: &[u8], algorithm: CompressionAlgorithm, level: i32) -> Result<Vec<u8>, StorageError> {
        match algorithm {
            CompressionAlgorithm::Gzip => self.compress_gzip(data, level),
            CompressionAlgorithm::Deflate => self.compress_deflate(data, level),
            CompressionAlgorithm::Brotli => self.compress_brotli(data, level),
            CompressionAlgorithm::Lz4 => self.compress_lz4(data),
            CompressionAlgorithm::None => Ok(data.to_vec()),
        }
    }

    /// Shannon entropy in bits per byte; used to decide whether compression
    /// is worth attempting at all.
    fn entropy(data: &[u8]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let mut counts = [0u64; 256];
        for &b in data {
            counts[b as usize] += 1;
        }
        let len = data.len() as f64;
        counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / len;
                -p * p.log2()
            })
            .sum()
    }
}

impl CompressionService for MultiAlgoCompression {
    fn compress(&self, data: &[u8], config: &CompressionConfig) -> Result<CompressionOutcome, StorageError> {
        let original_size = data.len() as u64;

        if !config.enabled || data.len() < config.min_size as usize {
            return Ok(CompressionOutcome {
                data: data.to_vec(),
                compressed: false,
                algorithm: CompressionAlgorithm::None,
                original_size,
                compression_ratio: 1.0,
            });
        }

        let algorithm = config.algorithm.resolve(data.len());
        let compressed = self.compress_with(data, algorithm, config.clamped_level())?;
        let ratio = if original_size == 0 {
            1.0
        } else {
            compressed.len() as f64 / original_size as f64
        };

        if ratio > COMPRESSION_EXPANSION_GUARD {
            return Ok(CompressionOutcome {
                data: data.to_vec(),
                compressed: false,
                algorithm: CompressionAlgorithm::None,
                original_size,
                compression_ratio: 1.0,
            });
        }

        Ok(CompressionOutcome {
            data: compressed,
            compressed: true,
            algorithm,
            original_size,
            compression_ratio: ratio,
        })
    }

    fn decompress(
        &self,
        data: &[u8],
        algorithm: CompressionAlgorithm,
        compressed: bool,
    ) -> Result<Vec<u8>, StorageError> {
        if !compressed {
            return Ok(data.to_vec());
        }
        match algorithm {
            CompressionAlgorithm::Gzip => self.decompress_gzip(data),
            CompressionAlgorithm::Deflate => self.decompress_deflate(data),
            CompressionAlgorithm::Brotli => self.decompress_brotli(data),
            CompressionAlgorithm::Lz4 => self.decompress_lz4(data),
            CompressionAlgorithm::None => Ok(data.to_vec()),
        }
    }

    fn analyze(&self, data: &[u8], config: &CompressionConfig) -> CompressionAnalysis {
        let entropy_bits_per_byte = Self::entropy(data);
        // High-entropy data (close to 8 bits/byte, e.g. already-compressed or
        // encrypted payloads) rarely compresses further.
        let should_compress = data.len() >= config.min_size as usize && entropy_bits_per_byte < 7.2;
        let estimated_ratio = if entropy_bits_per_byte <= 0.0 {
            0.1
        } else {
            (entropy_bits_per_byte / 8.0).clamp(0.05, 1.0)
        };
        CompressionAnalysis {
            entropy_bits_per_byte,
            estimated_ratio,
            recommended_algorithm: config.algorithm.resolve(data.len()),
            should_compress,
        }
    }

    fn benchmark(&self, sample: &[u8]) -> Result<Vec<CompressionBenchmark>, StorageError> {
        [CompressionAlgorithm::Lz4, CompressionAlgorithm::Brotli, CompressionAlgorithm::Deflate]
            .into_iter()
            .map(|algorithm| {
                let start = Instant::now();
                let compressed = self.compress_with(sample, algorithm, 6)?;
                let time = start.elapsed();
                let ratio = if sample.is_empty() {
                    1.0
                } else {
                    compressed.len() as f64 / sample.len() as f64
                };
                Ok(CompressionBenchmark {
                    algorithm,
                    time,
                    ratio,
                    size: compressed.len() as u64,
                })
            })
            .collect()
    }

    fn supported_algorithms(&self) -> Vec<CompressionAlgorithm> {
        vec![
            CompressionAlgorithm::Gzip,
            CompressionAlgorithm::Deflate,
            CompressionAlgorithm::Lz4,
            CompressionAlgorithm::Brotli,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CompressionConfig {
        CompressionConfig {
            enabled: true,
            algorithm: strongbox_domain::config::CompressionAlgorithmChoice::Gzip,
            min_size: 16,
            level: 6,
        }
    }

    #[test]
    fn round_trips_through_gzip() {
        let svc = MultiAlgoCompression::new();
        let data = b"hello hello hello hello hello hello hello hello".to_vec();
        let outcome = svc.compress(&data, &cfg()).unwrap();
        assert!(outcome.compressed);
        let back = svc.decompress(&outcome.data, outcome.algorithm, outcome.compressed).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn skips_compression_below_min_size() {
        let svc = MultiAlgoCompression::new();
        let data = b"tiny".to_vec();
        let outcome = svc.compress(&data, &cfg()).unwrap();
        assert!(!outcome.compressed);
        assert_eq!(outcome.data, data);
    }

    #[test]
    fn lz4_round_trips() {
        let svc = MultiAlgoCompression::new();
        let data = vec![7u8; 4096];
        let compressed = svc.compress_with(&data, CompressionAlgorithm::Lz4, 0).unwrap();
        let back = svc.decompress(&compressed, CompressionAlgorithm::Lz4, true).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn benchmark_reports_every_supported_algorithm() {
        let svc = MultiAlgoCompression::new();
        let data = b"hello hello hello hello hello hello hello hello".repeat(4);
        let results = svc.benchmark(&data).unwrap();
        let algorithms: Vec<_> = results.iter().map(|r| r.algorithm).collect();
        assert_eq!(algorithms.len(), 3);
        assert!(algorithms.contains(&CompressionAlgorithm::Lz4));
        assert!(algorithms.contains(&CompressionAlgorithm::Brotli));
        assert!(algorithms.contains(&CompressionAlgorithm::Deflate));
    }

    #[test]
    fn high_entropy_data_is_not_recommended_for_compression() {
        let svc = MultiAlgoCompression::new();
        let random: Vec<u8> = (0..4096u32).map(|i| (i * 2654435761u32) as u8).collect();
        let analysis = svc.analyze(&random, &cfg());
        assert!(analysis.entropy_bits_per_byte > 6.0);
    }
}
