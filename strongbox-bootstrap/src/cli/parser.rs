// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap.
//!
//! This module defines the CLI structure and handles argument parsing.
//! Security validation happens in the `validator` module after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure.
#[derive(Parser, Debug, Clone)]
#[command(name = "strongbox")]
#[command(about = concat!("Strongbox storage engine CLI v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to `strongbox.toml`, searched
    /// upward from the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the backing store path (SQLite file, ignored for the memory
    /// adapter)
    #[arg(long)]
    pub store_path: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch a single value by key.
    Get {
        /// Storage key, e.g. `users:42`
        key: String,
    },

    /// Store a value under a key.
    Set {
        /// Storage key, e.g. `users:42`
        key: String,

        /// JSON value, given inline
        #[arg(long, conflicts_with = "file")]
        value: Option<String>,

        /// Read the JSON value from a file instead of the command line
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a value by key.
    Delete {
        /// Storage key to remove
        key: String,
    },

    /// List keys under a namespace prefix.
    List {
        /// Namespace to scan, e.g. `users` (all keys if omitted)
        prefix: Option<String>,
    },

    /// Run pending migrations and print the run report.
    Migrate,

    /// Print a health snapshot (namespace count, size, cache hit ratio).
    Health,

    /// Store a secret in the sealed vault.
    VaultSet {
        /// Secret name
        key: String,

        /// Secret value
        value: String,
    },

    /// Retrieve a secret from the sealed vault.
    VaultGet {
        /// Secret name
        key: String,
    },

    /// Rotate the vault's inner encryption key.
    VaultRotate,
}

/// Parse CLI arguments.
///
/// # Panics
///
/// `clap` exits the process with a usage message if parsing fails.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
