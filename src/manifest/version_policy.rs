//! Version decision for a package about to be published
//!
//! Kept free of I/O: the publisher performs the registry lookup and the
//! manifest write, this module only decides.

use semver::Version;

/// Version given to a package that was never published
pub const INITIAL_VERSION: &str = "0.0.1";

/// What to do with a package's version before publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDecision {
    /// Overwrite the manifest version with the run's explicit version
    Explicit(String),
    /// Let the registry tool bump the patch version in place
    BumpPatch { published: String },
    /// First publication
    Initial,
}

impl VersionDecision {
    /// Version to write into the manifest, `None` when the tool writes it
    pub fn manifest_version(&self) -> Option<&str> {
        match self {
            Self::Explicit(version) => Some(version),
            Self::BumpPatch { .. } => None,
            Self::Initial => Some(INITIAL_VERSION),
        }
    }
}

/// Whether the explicit version applies to this run
pub fn uses_explicit_version(explicit: Option<&str>, single_element: bool) -> bool {
    explicit.is_some() && !single_element
}

/// Whether `version` parses as SemVer; npm rejects anything else on publish
pub fn is_semver(version: &str) -> bool {
    Version::parse(version).is_ok()
}

/// Decide the version for a package.
///
/// `published` is the registry lookup result; it is ignored when the
/// explicit version applies. The explicit version is taken as given.
///
/// # Examples
///
/// ```
/// use npm_workspace_publisher::manifest::{decide_version, VersionDecision};
///
/// assert_eq!(decide_version(None, false, None), VersionDecision::Initial);
/// ```
pub fn decide_version(
    explicit: Option<&str>,
    single_element: bool,
    published: Option<&str>,
) -> VersionDecision {
    if let Some(version) = explicit.filter(|_| !single_element) {
        return VersionDecision::Explicit(version.to_string());
    }

    match published.map(str::trim).filter(|v| !v.is_empty()) {
        Some(published) => VersionDecision::BumpPatch {
            published: published.to_string(),
        },
        None => VersionDecision::Initial,
    }
}
