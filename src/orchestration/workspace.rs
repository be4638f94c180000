//! Whole-run pipeline: credential, scan, configure and publish

use crate::core::config::ActionConfig;
use crate::core::error::PublishError;
use crate::core::traits::{PublishSummary, RegistryClient};
use crate::orchestration::package_publisher::{PackagePublisher, PublishOptions};
use crate::orchestration::reporter::ActionsReporter;
use crate::registry::{RegistryConfig, RegistryConfigurator};
use crate::scanner::ManifestScanner;
use crate::security::{Credential, SecretMasker};
use secrecy::ExposeSecret;
use tracing::info;

/// Publish every package of the workspace described by `config`.
///
/// `make_client` receives the masker for the resolved credential so the
/// client can keep it out of its error messages.
///
/// # Errors
///
/// Only run-level failures are returned: missing credentials, no manifests,
/// or no package published at all. Per-package failures are in the summary.
pub async fn publish_workspace<C, F>(
    config: &ActionConfig,
    reporter: &ActionsReporter,
    make_client: F,
) -> Result<PublishSummary, PublishError>
where
    C: RegistryClient,
    F: FnOnce(&SecretMasker) -> C,
{
    let credential = Credential::resolve(
        config.token.as_ref().map(|t| t.expose_secret()),
        config.credentials.as_ref().map(|c| c.expose_secret()),
    )?;
    match credential {
        Credential::Token(_) => info!("npmrc uses REGISTRY_TOKEN"),
        Credential::Auth(_) => info!("npmrc uses REGISTRY_CREDENTIALS"),
    }

    let scanner = ManifestScanner::new(&config.workspace, config.scan_dirs.clone());
    info!(
        "Directories to scan:\n\t- {}",
        scanner.patterns().join("\n\t- ")
    );
    let manifests = scanner.scan()?;

    let configurator = RegistryConfigurator::new(RegistryConfig {
        registry_url: config.registry.clone(),
        credential,
        extra_options: config.npmrc_options.clone(),
    });
    let client = make_client(configurator.masker());

    let options = PublishOptions {
        target_version: config.target_version.clone(),
        single_element: config.single_element,
        access: config.access,
    };
    let publisher = PackagePublisher::new(options, configurator, client, reporter.clone());

    let summary = publisher.publish_all(&manifests).await?;
    if summary.is_empty() {
        return Err(PublishError::NoPublicationsSucceeded);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::NpmAccess;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Registry whose publish outcome is fixed, recording every call
    struct ScriptedRegistry {
        accept: bool,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl ScriptedRegistry {
        fn new(accept: bool) -> Self {
            Self {
                accept,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RegistryClient for ScriptedRegistry {
        async fn published_version(
            &self,
            package_dir: &Path,
            _package: &str,
        ) -> Result<Option<String>, PublishError> {
            self.calls.lock().unwrap().push(package_dir.to_path_buf());
            Ok(None)
        }

        async fn bump_patch(&self, _package_dir: &Path, _package: &str) -> Result<(), PublishError> {
            Ok(())
        }

        async fn publish(
            &self,
            _package_dir: &Path,
            package: &str,
            _access: Option<NpmAccess>,
        ) -> Result<String, PublishError> {
            if self.accept {
                Ok(String::new())
            } else {
                Err(PublishError::PublishFailed {
                    package: package.to_string(),
                    message: "npm ERR! 403".to_string(),
                })
            }
        }
    }

    fn config(workspace: &Path, token: Option<&str>) -> ActionConfig {
        ActionConfig {
            token: token.map(|t| SecretString::new(t.into())),
            workspace: workspace.to_path_buf(),
            scan_dirs: vec!["packages".to_string()],
            ..Default::default()
        }
    }

    fn write_package(root: &Path, name: &str) {
        let dir = root.join("packages").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("package.json"), format!(r#"{{"name": "{}"}}"#, name)).unwrap();
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_activity() {
        let temp_dir = TempDir::new().unwrap();
        write_package(temp_dir.path(), "a");
        let mut client_built = false;

        let result = publish_workspace(
            &config(temp_dir.path(), None),
            &ActionsReporter::default(),
            |_| {
                client_built = true;
                ScriptedRegistry::new(true)
            },
        )
        .await;

        assert!(matches!(result, Err(PublishError::MissingCredential)));
        assert!(!client_built);
        assert!(!temp_dir.path().join("packages/a/.npmrc").exists());
    }

    #[tokio::test]
    async fn test_no_manifests_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("packages")).unwrap();

        let result = publish_workspace(
            &config(temp_dir.path(), Some("abc123")),
            &ActionsReporter::default(),
            |_| ScriptedRegistry::new(true),
        )
        .await;

        assert!(matches!(result, Err(PublishError::NoManifestsFound { .. })));
    }

    #[tokio::test]
    async fn test_no_publications_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        write_package(temp_dir.path(), "a");

        let result = publish_workspace(
            &config(temp_dir.path(), Some("abc123")),
            &ActionsReporter::default(),
            |_| ScriptedRegistry::new(false),
        )
        .await;

        assert!(matches!(result, Err(PublishError::NoPublicationsSucceeded)));
    }

    #[tokio::test]
    async fn test_successful_run_reports_modules() {
        let temp_dir = TempDir::new().unwrap();
        write_package(temp_dir.path(), "a");
        write_package(temp_dir.path(), "b");

        let summary = publish_workspace(
            &config(temp_dir.path(), Some("abc123")),
            &ActionsReporter::default(),
            |_| ScriptedRegistry::new(true),
        )
        .await
        .unwrap();

        assert_eq!(summary.modules(), "a@0.0.1, b@0.0.1");
        assert!(summary.failures.is_empty());
    }

    #[tokio::test]
    async fn test_client_receives_credential_masker() {
        let temp_dir = TempDir::new().unwrap();
        write_package(temp_dir.path(), "a");
        let mut masked = String::new();

        publish_workspace(
            &config(temp_dir.path(), Some("abc123")),
            &ActionsReporter::default(),
            |masker| {
                masked = masker.mask("_authToken=abc123");
                ScriptedRegistry::new(true)
            },
        )
        .await
        .unwrap();

        assert_eq!(masked, "_authToken=TOKEN");
    }
}
