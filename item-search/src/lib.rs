//! # Item Search
//!
//! Library behind the `item-search` command line tool.
//!
//! This crate provides configuration loading, backend wiring and the
//! operations each subcommand runs.

pub mod commands;
pub mod config;

pub use commands::{SearchArgs, Services};
pub use config::{AppConfig, BackendKind};

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A command line argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    PipelineError(#[from] item_search_pipeline::PipelineError),

    #[error(transparent)]
    SearchError(#[from] item_search_repository::SearchError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
