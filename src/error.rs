//! # Error Handling
//!
//! This module defines the centralized error type for `forkpatch`. It uses
//! `thiserror` to build a single `Error` enum covering every failure the
//! library can report, so the CLI can print a one-line summary together with
//! the offending path or descriptor.
//!
//! ## Taxonomy
//!
//! Variants are grouped into the kinds returned by [`Error::kind`]:
//!
//! - **ConfigurationError**: malformed `forkpatch.yaml`, duplicate modules,
//!   duplicate patch outputs, invalid refs or exclude patterns.
//! - **UpstreamFetchError**: the VCS collaborator could not materialise the
//!   upstream checkout.
//! - **MissingUpstreamPathError**: a descriptor points at an upstream path that
//!   does not exist in the staging tree.
//! - **PatchConflictError**: a patch did not apply cleanly. Carries the
//!   identity of the failing descriptor.
//! - **UnknownTaskError**: no build task is registered under the given name.
//! - **StaleOutputError**: patched outputs no longer match the last sync.
//! - **IOError**: filesystem, serialization and subprocess failures.
//!
//! Nothing is retried automatically. Errors surface to the CLI unmodified.

use thiserror::Error;

/// Main error type for forkpatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file or a value derived from it is invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Two patch descriptors write the same output path.
    #[error("Duplicate patch descriptor: output path '{output}' is already registered")]
    DuplicateDescriptor { output: String },

    /// Two modules share a name.
    #[error("Duplicate module: '{name}' is declared more than once")]
    DuplicateModule { name: String },

    /// The upstream source could not be fetched or checked out.
    #[error("Upstream fetch error for {url}@{reference}: {message}")]
    UpstreamFetch {
        url: String,
        reference: String,
        message: String,
    },

    /// A descriptor references an upstream path absent from the staging tree.
    #[error("Missing upstream path '{path}' required by {descriptor}")]
    MissingUpstreamPath { descriptor: String, path: String },

    /// A patch did not apply cleanly.
    #[error("Patch conflict in {descriptor}: {patch} does not apply\n{message}")]
    PatchConflict {
        descriptor: String,
        patch: String,
        message: String,
    },

    /// No build task is registered under the requested name.
    #[error("Unknown task '{name}'")]
    UnknownTask { name: String },

    /// Outputs differ from what the last sync produced.
    #[error("Outputs are out of date: {stale} changed on disk{}", if *inputs_changed { ", inputs changed" } else { "" })]
    StaleOutputs { stale: usize, inputs_changed: bool },

    /// A git subprocess failed outside of fetch or apply.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// A filesystem operation on a specific path failed.
    #[error("Filesystem error at '{path}': {message}")]
    Filesystem { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error while reading or writing sync state.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Returns the taxonomy name of this error, as printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. }
            | Error::DuplicateDescriptor { .. }
            | Error::DuplicateModule { .. }
            | Error::Yaml(_)
            | Error::Glob(_)
            | Error::UrlParse(_) => "ConfigurationError",
            Error::UpstreamFetch { .. } => "UpstreamFetchError",
            Error::MissingUpstreamPath { .. } => "MissingUpstreamPathError",
            Error::PatchConflict { .. } => "PatchConflictError",
            Error::UnknownTask { .. } => "UnknownTaskError",
            Error::StaleOutputs { .. } => "StaleOutputError",
            Error::GitCommand { .. }
            | Error::Filesystem { .. }
            | Error::Io(_)
            | Error::Json(_) => "IOError",
        }
    }

    /// Shorthand for a `Configuration` error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn at_path(path: &std::path::Path, err: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
