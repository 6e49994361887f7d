// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the storage engine proper and
//! provides everything a binary embedding Strongbox needs before it can
//! construct a `StorageManager`:
//!
//! - **Configuration loading** - `strongbox.toml` discovery and parsing
//! - **CLI parsing** - secure argument parsing and validation
//! - **Entry point** - exit-code mapping for `main()`
//! - **Platform abstraction** - OS-specific operations (POSIX vs Windows)
//! - **Signal handling** - graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Logging** - a minimal, swappable logging trait for the bootstrap phase
//! - **Shutdown coordination** - cancellation tokens with a grace period
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (this crate)              │
//! │  - Entry Point / Exit Codes                  │
//! │  - Configuration Loading                     │
//! │  - Platform Abstraction                      │
//! │  - Signal Handling                           │
//! │  - Secure Arg Parsing                        │
//! └─────────────────────┬─────────────────────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │              strongbox (engine)              │
//! │  StorageManager / adapters / cache / vault   │
//! └─────────────────────────────────────────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │            strongbox-domain                  │
//! │  types, traits, StorageConfig, StorageError  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from the engine** — this crate can depend on
//!    `strongbox-domain`, but the engine crate never depends back on it.
//! 2. **Platform abstraction** — OS-specific functionality lives behind the
//!    `Platform` trait, selected at compile time.
//! 3. **Graceful shutdown** — signal handlers feed a `ShutdownCoordinator`
//!    with a grace period, so an in-flight write finishes before the process
//!    exits.
//! 4. **Security first** — CLI arguments are validated for injection
//!    patterns and path traversal before they ever reach the engine.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use strongbox_bootstrap::{bootstrap_cli, config::load_config, exit_code::result_to_exit_code};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let validated_cli = match bootstrap_cli() {
//!         Ok(cli) => cli,
//!         Err(e) => {
//!             eprintln!("CLI error: {e}");
//!             return std::process::ExitCode::from(64);
//!         }
//!     };
//!
//!     let storage_config = load_config(validated_cli.config.as_deref());
//!     let result = storage_config.map(|_cfg| ());
//!     result_to_exit_code(result)
//! }
//! ```
//!
//! ## Module Structure
//!
//! - `cli` - secure argument parsing (`parser` + `validator` submodules)
//! - `config` - `StorageConfig` loading from `strongbox.toml`
//! - `exit_code` - Unix exit code mapping from `StorageError`
//! - `logger` - bootstrap-specific logging
//! - `platform` - OS abstraction (Unix/Windows)
//! - `signals` - signal handling (SIGTERM, SIGINT, SIGHUP)
//! - `shutdown` - shutdown coordination

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Bootstrap and parse CLI arguments.
///
/// This is the main entry point for the bootstrap layer. It handles:
/// 1. CLI parsing with clap
/// 2. Security validation
///
/// The caller is responsible for loading configuration via
/// [`config::load_config`], constructing a `StorageManager`, running it, and
/// mapping the result to an exit code via [`result_to_exit_code`].
///
/// # Errors
///
/// Returns [`cli::ParseError`] if CLI parsing or validation fails. `clap`
/// handles `--help`/`--version` itself and exits the process directly.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
