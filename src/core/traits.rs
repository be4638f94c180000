//! Core traits and types for package publishing
//!
//! `RegistryClient` is the seam between the publishing workflow and the
//! external registry tool.

use crate::core::config::NpmAccess;
use crate::core::error::PublishError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Registry client
// ============================================================================

/// Operations the publisher delegates to the registry tool.
///
/// Every call runs inside the package directory so that the `.npmrc`
/// written there selects the registry and credential.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Currently published version of `package`, `None` if never published
    async fn published_version(
        &self,
        package_dir: &Path,
        package: &str,
    ) -> Result<Option<String>, PublishError>;

    /// Bump the patch version of the manifest in `package_dir` in place
    async fn bump_patch(&self, package_dir: &Path, package: &str) -> Result<(), PublishError>;

    /// Publish the package in `package_dir`
    async fn publish(
        &self,
        package_dir: &Path,
        package: &str,
        access: Option<NpmAccess>,
    ) -> Result<String, PublishError>;
}

// ============================================================================
// Publication results
// ============================================================================

/// A successfully published `name@version`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicationRecord {
    pub name: String,
    pub version: String,
}

impl fmt::Display for PublicationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A package that could not be published
#[derive(Debug)]
pub struct PackageFailure {
    pub manifest: PathBuf,
    pub error: PublishError,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct PublishSummary {
    pub publications: BTreeSet<PublicationRecord>,
    pub failures: Vec<PackageFailure>,
}

impl PublishSummary {
    /// Published packages joined as `a@1.0.0, b@0.0.1`
    pub fn modules(&self) -> String {
        self.publications
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }
}
