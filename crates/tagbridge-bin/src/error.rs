// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary-level errors.

use thiserror::Error;

use tagbridge_config::ConfigError;
use tagbridge_core::error::EngineError;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The engine reported a failure.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Network host discovery failed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Writing command output failed.
    #[error("Output error: {0}")]
    Output(String),
}

impl BinError {
    /// Creates a discovery error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery(message.into())
    }

    /// Creates an output error.
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}

/// A Result type with BinError.
pub type BinResult<T> = Result<T, BinError>;
