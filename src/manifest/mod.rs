pub mod package_json;
pub mod version_policy;

pub use package_json::{MANIFEST_FILENAME, PackageManifest};
pub use version_policy::{
    INITIAL_VERSION, VersionDecision, decide_version, is_semver, uses_explicit_version,
};
