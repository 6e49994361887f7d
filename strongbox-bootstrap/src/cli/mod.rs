// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::SecureArgParser      │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration.
///
/// Holds all CLI arguments after security validation: every path is
/// canonicalized, every key/value argument has been checked for
/// injection-style patterns.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
}

/// Validated command variants.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Get { key: String },
    Set { key: String, value: Option<String>, file: Option<PathBuf> },
    Delete { key: String },
    List { prefix: Option<String> },
    Migrate,
    Health,
    VaultSet { key: String, value: String },
    VaultGet { key: String },
    VaultRotate,
}

/// Parse and validate CLI arguments.
///
/// # Errors
///
/// Returns [`ParseError`] if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = match cli.config.as_ref() {
        Some(path) => {
            SecureArgParser::validate_argument(&path.to_string_lossy())?;
            Some(path.clone())
        }
        None => None,
    };

    let store_path = match cli.store_path.as_ref() {
        Some(path) => {
            SecureArgParser::validate_argument(&path.to_string_lossy())?;
            Some(path.clone())
        }
        None => None,
    };

    let command = match cli.command {
        Commands::Get { key } => {
            SecureArgParser::validate_key(&key)?;
            ValidatedCommand::Get { key }
        }
        Commands::Set { key, value, file } => {
            SecureArgParser::validate_key(&key)?;
            if let Some(ref v) = value {
                SecureArgParser::validate_argument(v)?;
            }
            let validated_file = match file {
                Some(ref path) => Some(SecureArgParser::validate_path(&path.to_string_lossy())?),
                None => None,
            };
            ValidatedCommand::Set {
                key,
                value,
                file: validated_file,
            }
        }
        Commands::Delete { key } => {
            SecureArgParser::validate_key(&key)?;
            ValidatedCommand::Delete { key }
        }
        Commands::List { prefix } => {
            if let Some(ref p) = prefix {
                SecureArgParser::validate_argument(p)?;
            }
            ValidatedCommand::List { prefix }
        }
        Commands::Migrate => ValidatedCommand::Migrate,
        Commands::Health => ValidatedCommand::Health,
        Commands::VaultSet { key, value } => {
            SecureArgParser::validate_key(&key)?;
            SecureArgParser::validate_argument(&value)?;
            ValidatedCommand::VaultSet { key, value }
        }
        Commands::VaultGet { key } => {
            SecureArgParser::validate_key(&key)?;
            ValidatedCommand::VaultGet { key }
        }
        Commands::VaultRotate => ValidatedCommand::VaultRotate,
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        store_path,
    })
}
