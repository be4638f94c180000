//! npm CLI client
//!
//! Implements `RegistryClient` by shelling out to `npm` inside the package
//! directory:
//! - `npm show <name> version` to look up the published version
//! - `npm version patch --no-git-tag-version` to bump in place
//! - `npm publish --verbose [--access <level>]` to publish

use crate::core::config::NpmAccess;
use crate::core::error::PublishError;
use crate::core::traits::RegistryClient;
use crate::security::{CommandOutput, SafeCommandExecutor, SecretMasker};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Registry client backed by the npm CLI
#[derive(Debug, Clone)]
pub struct NpmCli {
    timeout: Option<Duration>,
    masker: SecretMasker,
}

impl NpmCli {
    /// Create a client; `masker` hides the credential in error messages
    pub fn new(timeout: Option<Duration>, masker: SecretMasker) -> Self {
        Self { timeout, masker }
    }

    /// Arguments for `npm publish`
    fn publish_args(access: Option<NpmAccess>) -> Vec<&'static str> {
        let mut args = vec!["publish", "--verbose"];
        if let Some(access) = access {
            args.push("--access");
            args.push(access.as_str());
        }
        args
    }

    async fn run(&self, package_dir: &Path, args: &[&str]) -> Result<CommandOutput, PublishError> {
        let command_error = |e: crate::security::CommandError| PublishError::CommandError {
            message: e.to_string(),
        };

        let mut executor = SafeCommandExecutor::new(package_dir).map_err(command_error)?;
        if let Some(timeout) = self.timeout {
            executor.set_timeout(timeout);
        }

        executor.execute("npm", args).await.map_err(command_error)
    }
}

#[async_trait]
impl RegistryClient for NpmCli {
    async fn published_version(
        &self,
        package_dir: &Path,
        package: &str,
    ) -> Result<Option<String>, PublishError> {
        let output = self.run(package_dir, &["show", package, "version"]).await?;

        // E404 for packages that were never published
        if output.is_failure() {
            debug!(package, output = %self.masker.mask(&output.combined()), "no published version");
            return Ok(None);
        }

        let version = output.stdout.trim();
        Ok((!version.is_empty()).then(|| version.to_string()))
    }

    async fn bump_patch(&self, package_dir: &Path, package: &str) -> Result<(), PublishError> {
        let output = self
            .run(package_dir, &["version", "patch", "--no-git-tag-version"])
            .await?;

        if output.is_failure() {
            return Err(PublishError::VersionResolution {
                package: package.to_string(),
                message: self.masker.mask(&output.combined()),
            });
        }

        Ok(())
    }

    async fn publish(
        &self,
        package_dir: &Path,
        package: &str,
        access: Option<NpmAccess>,
    ) -> Result<String, PublishError> {
        let args = Self::publish_args(access);
        let output = self.run(package_dir, &args).await?;
        let combined = self.masker.mask(&output.combined());

        if output.is_failure() {
            return Err(PublishError::PublishFailed {
                package: package.to_string(),
                message: combined,
            });
        }

        Ok(combined)
    }
}
