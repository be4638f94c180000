//! Error handling for workspace publishing
//!
//! Run-level errors abort the whole run. Per-package errors are caught at the
//! manifest boundary by the publisher, logged, and the loop moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Run-level errors
    #[error("Missing REGISTRY_TOKEN or REGISTRY_CREDENTIALS.")]
    MissingCredential,

    #[error("No elements detected in the given directories (could not find package.json): {patterns}")]
    NoManifestsFound { patterns: String },

    #[error("Invalid scan pattern '{pattern}': {message}")]
    InvalidScanPattern { pattern: String, message: String },

    #[error("Did not successfully publish any modules.")]
    NoPublicationsSucceeded,

    // Per-package errors
    #[error("Failed to parse manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to write manifest {}: {message}", path.display())]
    ManifestWrite { path: PathBuf, message: String },

    #[error("Failed to write registry configuration {}: {message}", path.display())]
    ConfigurationWrite { path: PathBuf, message: String },

    #[error("[{package}] Failed to resolve version: {message}")]
    VersionResolution { package: String, message: String },

    #[error("[{package}] Publishing failed: {message}")]
    PublishFailed { package: String, message: String },

    #[error("Command execution error: {message}")]
    CommandError { message: String },
}

impl PublishError {
    /// Check if this error only affects a single package
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::MissingCredential
                | Self::NoManifestsFound { .. }
                | Self::InvalidScanPattern { .. }
                | Self::NoPublicationsSucceeded
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingCredential => vec![
                "Set REGISTRY_TOKEN to an npm access token",
                "Or set REGISTRY_CREDENTIALS to a user:password pair",
            ],
            Self::NoManifestsFound { .. } => vec![
                "Check the scan directories relative to the workspace",
                "Make sure package.json files exist outside node_modules",
            ],
            Self::InvalidScanPattern { .. } => {
                vec!["Fix the glob syntax of the scan directories"]
            }
            Self::NoPublicationsSucceeded => vec![
                "Check the warnings emitted for each package",
                "Verify that the token has publish rights on the registry",
            ],
            Self::ManifestParse { .. } => vec!["Fix the JSON syntax of package.json"],
            Self::ManifestWrite { .. } => {
                vec!["Check write permissions of package.json"]
            }
            Self::ConfigurationWrite { .. } => {
                vec!["Check write permissions of the package directory"]
            }
            Self::VersionResolution { .. } => vec![
                "Check the npm version output above",
                "Make sure the published version is valid SemVer",
            ],
            Self::PublishFailed { .. } => vec![
                "Check the npm output above",
                "Make sure the version is not already published",
            ],
            Self::CommandError { .. } => vec!["Make sure npm is installed and on PATH"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::NoManifestsFound { .. } => "NO_MANIFESTS_FOUND",
            Self::InvalidScanPattern { .. } => "INVALID_SCAN_PATTERN",
            Self::NoPublicationsSucceeded => "NO_PUBLICATIONS_SUCCEEDED",
            Self::ManifestParse { .. } => "MANIFEST_PARSE",
            Self::ManifestWrite { .. } => "MANIFEST_WRITE",
            Self::ConfigurationWrite { .. } => "CONFIGURATION_WRITE",
            Self::VersionResolution { .. } => "VERSION_RESOLUTION",
            Self::PublishFailed { .. } => "PUBLISH_FAILED",
            Self::CommandError { .. } => "COMMAND_ERROR",
        }
    }
}
