//! Run configuration for npm-workspace-publisher
//!
//! Every input the pipeline needs is gathered into one `ActionConfig` at
//! startup and passed down explicitly. Nothing below the binary reads the
//! process environment.

use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Registry used when none is configured
pub const DEFAULT_REGISTRY: &str = "//registry.npmjs.org";

/// npm package access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NpmAccess {
    Public,
    Restricted,
}

impl NpmAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        }
    }
}

/// Root configuration object
#[derive(Debug)]
pub struct ActionConfig {
    /// Registry access token
    pub token: Option<SecretString>,

    /// Raw `user:password` credentials, encoded before use
    pub credentials: Option<SecretString>,

    /// Registry URL written into `.npmrc`
    pub registry: String,

    /// Workspace root that scan directories are relative to
    pub workspace: PathBuf,

    /// Workspace-relative directory fragments to scan
    pub scan_dirs: Vec<String>,

    /// Raw lines inserted verbatim into `.npmrc`
    pub npmrc_options: Vec<String>,

    /// Version applied to every package instead of bumping
    pub target_version: Option<String>,

    /// Publishing a single element: ignore `target_version`
    pub single_element: bool,

    /// Access level passed to `npm publish` for scoped packages
    pub access: Option<NpmAccess>,

    /// Per-command timeout for npm invocations
    pub command_timeout: Option<Duration>,

    /// File receiving `name=value` run outputs
    pub output_file: Option<PathBuf>,

    /// Emit workflow-command annotations for warnings and errors
    pub annotations: bool,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            token: None,
            credentials: None,
            registry: DEFAULT_REGISTRY.to_string(),
            workspace: PathBuf::from("."),
            scan_dirs: vec![String::new()],
            npmrc_options: Vec::new(),
            target_version: None,
            single_element: false,
            access: None,
            command_timeout: None,
            output_file: None,
            annotations: false,
        }
    }
}

impl ActionConfig {
    /// Registry URL, falling back to the default when blank
    pub fn registry_or_default(value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(registry) if !registry.is_empty() => registry.to_string(),
            _ => DEFAULT_REGISTRY.to_string(),
        }
    }

    /// Split a comma-separated input into trimmed entries.
    ///
    /// Blank entries are kept: a blank scan fragment means the workspace root.
    pub fn split_list(value: &str) -> Vec<String> {
        value.split(',').map(|s| s.trim().to_string()).collect()
    }

    /// Split the npmrc options input, dropping blank lines
    pub fn split_options(value: &str) -> Vec<String> {
        Self::split_list(value)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Explicit version, ignoring a blank value
    pub fn target_version_from(value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
