//! Package Publisher - per-manifest publishing loop
//!
//! For every discovered manifest:
//! - write the registry configuration next to it
//! - decide and persist the version
//! - publish through the registry client
//!
//! A failure is contained to its own package: it is reported as a warning
//! and the loop moves on to the next manifest.

use crate::core::config::NpmAccess;
use crate::core::error::PublishError;
use crate::core::traits::{PackageFailure, PublicationRecord, PublishSummary, RegistryClient};
use crate::manifest::{
    PackageManifest, VersionDecision, decide_version, is_semver, uses_explicit_version,
};
use crate::orchestration::reporter::ActionsReporter;
use crate::registry::RegistryConfigurator;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Version and access settings shared by every package of a run
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Version applied to every package
    pub target_version: Option<String>,

    /// Publishing a single element: ignore `target_version`
    pub single_element: bool,

    /// Access level requested for scoped packages
    pub access: Option<NpmAccess>,
}

/// Main package publisher
pub struct PackagePublisher<C> {
    options: PublishOptions,
    configurator: RegistryConfigurator,
    client: C,
    reporter: ActionsReporter,
}

impl<C: RegistryClient> PackagePublisher<C> {
    pub fn new(
        options: PublishOptions,
        configurator: RegistryConfigurator,
        client: C,
        reporter: ActionsReporter,
    ) -> Self {
        Self {
            options,
            configurator,
            client,
            reporter,
        }
    }

    /// Attempt every manifest, collecting publications and failures.
    ///
    /// # Errors
    ///
    /// Stops at the first error that is not recoverable; every other error
    /// is recorded as a failure of its package.
    pub async fn publish_all(
        &self,
        manifests: &BTreeSet<PathBuf>,
    ) -> Result<PublishSummary, PublishError> {
        let mut summary = PublishSummary::default();

        for manifest in manifests {
            info!("Attempting to publish from \"{}\"", manifest.display());

            match self.publish_one(manifest).await {
                Ok(record) => {
                    info!("Published {}", record);
                    summary.publications.insert(record);
                }
                Err(error) if error.is_recoverable() => {
                    self.reporter.warning(&error.to_string());
                    summary.failures.push(PackageFailure {
                        manifest: manifest.clone(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        Ok(summary)
    }

    /// Configure, version and publish a single manifest
    pub async fn publish_one(&self, manifest_path: &Path) -> Result<PublicationRecord, PublishError> {
        let mut manifest = PackageManifest::load(manifest_path).await?;
        let package_dir = manifest.package_dir().to_path_buf();
        let name = manifest.name().to_string();

        self.configurator.configure(&package_dir).await?;

        let explicit = self.options.target_version.as_deref();
        let published = if uses_explicit_version(explicit, self.options.single_element) {
            None
        } else {
            self.client.published_version(&package_dir, &name).await?
        };

        let decision = decide_version(explicit, self.options.single_element, published.as_deref());

        match &decision {
            VersionDecision::Explicit(version) => {
                info!("Setting new version of {} to {}", name, version);
                if !is_semver(version) {
                    warn!("{} is not a SemVer version; npm may reject it", version);
                }
            }
            VersionDecision::BumpPatch { published } => {
                info!(
                    "Current version of {} is {}. Incrementing patch...",
                    name, published
                );
            }
            VersionDecision::Initial => {
                info!(
                    "No previous version of {} found. Setting initial version...",
                    name
                );
            }
        }

        match decision.manifest_version() {
            Some(version) => {
                manifest.set_version(version);
                manifest.save().await?;
            }
            None => {
                self.client.bump_patch(&package_dir, &name).await?;
                manifest = PackageManifest::load(manifest_path).await?;
            }
        }

        let version = manifest
            .version()
            .ok_or_else(|| PublishError::VersionResolution {
                package: name.clone(),
                message: "manifest has no version after bump".to_string(),
            })?
            .to_string();

        let access = self.options.access.filter(|_| manifest.is_scoped());
        self.client.publish(&package_dir, &name, access).await?;

        Ok(PublicationRecord { name, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILENAME;
    use crate::registry::{NPMRC_FILENAME, RegistryConfig};
    use crate::security::Credential;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory registry standing in for the npm CLI
    #[derive(Default)]
    struct FakeRegistry {
        published: HashMap<String, String>,
        failing: Vec<String>,
        fatal: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn published_version(
            &self,
            _package_dir: &Path,
            package: &str,
        ) -> Result<Option<String>, PublishError> {
            self.calls.lock().unwrap().push(format!("show {}", package));
            Ok(self.published.get(package).cloned())
        }

        async fn bump_patch(&self, package_dir: &Path, package: &str) -> Result<(), PublishError> {
            self.calls.lock().unwrap().push(format!("bump {}", package));
            let path = package_dir.join(MANIFEST_FILENAME);
            let mut manifest = PackageManifest::load(&path).await?;
            let mut version = semver::Version::parse(manifest.version().unwrap_or("0.0.0")).unwrap();
            version.patch += 1;
            manifest.set_version(&version.to_string());
            manifest.save().await
        }

        async fn publish(
            &self,
            _package_dir: &Path,
            package: &str,
            access: Option<NpmAccess>,
        ) -> Result<String, PublishError> {
            let access = access.map(|a| a.as_str()).unwrap_or("default");
            self.calls
                .lock()
                .unwrap()
                .push(format!("publish {} {}", package, access));

            if self.fatal.iter().any(|f| f == package) {
                return Err(PublishError::MissingCredential);
            }
            if self.failing.iter().any(|f| f == package) {
                // Marker present even though the tool exited successfully
                return Err(PublishError::PublishFailed {
                    package: package.to_string(),
                    message: "npm ERR! code E403".to_string(),
                });
            }
            Ok(format!("+ {}", package))
        }
    }

    fn configurator() -> RegistryConfigurator {
        RegistryConfigurator::new(RegistryConfig {
            registry_url: "//reg.example.com".to_string(),
            credential: Credential::resolve(Some("abc123"), None).unwrap(),
            extra_options: Vec::new(),
        })
    }

    fn publisher(options: PublishOptions, registry: FakeRegistry) -> PackagePublisher<FakeRegistry> {
        PackagePublisher::new(options, configurator(), registry, ActionsReporter::default())
    }

    fn write_package(root: &Path, dir: &str, content: &str) -> PathBuf {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(MANIFEST_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn read_version(path: &Path) -> String {
        let content = std::fs::read_to_string(path).unwrap();
        PackageManifest::parse(path, &content)
            .unwrap()
            .version()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_explicit_version_applied_to_every_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_package(temp_dir.path(), "a", r#"{"name": "a", "version": "1.0.0"}"#);
        let b = write_package(temp_dir.path(), "b", r#"{"name": "b", "version": "3.1.4"}"#);
        let registry = FakeRegistry {
            published: HashMap::from([("a".to_string(), "5.0.0".to_string())]),
            ..Default::default()
        };
        let publisher = publisher(
            PublishOptions {
                target_version: Some("2.0.0".to_string()),
                ..Default::default()
            },
            registry,
        );

        let summary = publisher
            .publish_all(&BTreeSet::from([a.clone(), b.clone()]))
            .await
            .unwrap();

        assert_eq!(summary.modules(), "a@2.0.0, b@2.0.0");
        assert_eq!(read_version(&a), "2.0.0");
        assert_eq!(read_version(&b), "2.0.0");
        assert!(
            !publisher.client.calls().iter().any(|c| c.starts_with("show")),
            "explicit version must skip the registry lookup"
        );
    }

    #[tokio::test]
    async fn test_unpublished_package_gets_initial_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_package(temp_dir.path(), "pkg", r#"{"name": "fresh", "version": "9.9.9"}"#);
        let publisher = publisher(PublishOptions::default(), FakeRegistry::default());

        let record = publisher.publish_one(&path).await.unwrap();

        assert_eq!(record.to_string(), "fresh@0.0.1");
        assert_eq!(read_version(&path), "0.0.1");
    }

    #[tokio::test]
    async fn test_published_package_is_bumped() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_package(temp_dir.path(), "pkg", r#"{"name": "pkg", "version": "1.2.3"}"#);
        let registry = FakeRegistry {
            published: HashMap::from([("pkg".to_string(), "1.2.3".to_string())]),
            ..Default::default()
        };
        let publisher = publisher(PublishOptions::default(), registry);

        let record = publisher.publish_one(&path).await.unwrap();

        assert_eq!(record.to_string(), "pkg@1.2.4");
        assert_eq!(
            publisher.client.calls(),
            vec!["show pkg", "bump pkg", "publish pkg default"]
        );
    }

    #[tokio::test]
    async fn test_single_element_ignores_explicit_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_package(temp_dir.path(), "pkg", r#"{"name": "pkg", "version": "1.0.0"}"#);
        let publisher = publisher(
            PublishOptions {
                target_version: Some("2.0.0".to_string()),
                single_element: true,
                ..Default::default()
            },
            FakeRegistry::default(),
        );

        let record = publisher.publish_one(&path).await.unwrap();

        assert_eq!(record.version, "0.0.1");
    }

    #[tokio::test]
    async fn test_malformed_manifest_does_not_block_siblings() {
        let temp_dir = TempDir::new().unwrap();
        let manifests = BTreeSet::from([
            write_package(temp_dir.path(), "a", r#"{"name": "a"}"#),
            write_package(temp_dir.path(), "b", r#"{"name": "b", "#),
            write_package(temp_dir.path(), "c", r#"{"name": "c"}"#),
        ]);
        let publisher = publisher(PublishOptions::default(), FakeRegistry::default());

        let summary = publisher.publish_all(&manifests).await.unwrap();

        assert_eq!(summary.publications.len(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(
            summary.failures[0].error,
            PublishError::ManifestParse { .. }
        ));
        assert!(summary.failures[0].manifest.ends_with("b/package.json"));
    }

    #[tokio::test]
    async fn test_error_marker_marks_package_failed() {
        let temp_dir = TempDir::new().unwrap();
        let manifests = BTreeSet::from([
            write_package(temp_dir.path(), "ok", r#"{"name": "ok"}"#),
            write_package(temp_dir.path(), "denied", r#"{"name": "denied"}"#),
        ]);
        let registry = FakeRegistry {
            failing: vec!["denied".to_string()],
            ..Default::default()
        };
        let publisher = publisher(PublishOptions::default(), registry);

        let summary = publisher.publish_all(&manifests).await.unwrap();

        assert_eq!(summary.modules(), "ok@0.0.1");
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(
            summary.failures[0].error,
            PublishError::PublishFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_fatal_error_stops_the_loop() {
        let temp_dir = TempDir::new().unwrap();
        let manifests = BTreeSet::from([
            write_package(temp_dir.path(), "a", r#"{"name": "a"}"#),
            write_package(temp_dir.path(), "b", r#"{"name": "b"}"#),
        ]);
        let registry = FakeRegistry {
            fatal: vec!["a".to_string()],
            ..Default::default()
        };
        let publisher = publisher(PublishOptions::default(), registry);

        let result = publisher.publish_all(&manifests).await;

        assert!(matches!(result, Err(PublishError::MissingCredential)));
        assert_eq!(publisher.client.calls(), vec!["show a", "publish a default"]);
    }

    #[tokio::test]
    async fn test_access_only_for_scoped_packages() {
        let temp_dir = TempDir::new().unwrap();
        let manifests = BTreeSet::from([
            write_package(temp_dir.path(), "plain", r#"{"name": "plain"}"#),
            write_package(temp_dir.path(), "scoped", r#"{"name": "@org/scoped"}"#),
        ]);
        let publisher = publisher(
            PublishOptions {
                access: Some(NpmAccess::Public),
                ..Default::default()
            },
            FakeRegistry::default(),
        );

        publisher.publish_all(&manifests).await.unwrap();

        let calls = publisher.client.calls();
        assert!(calls.contains(&"publish plain default".to_string()));
        assert!(calls.contains(&"publish @org/scoped public".to_string()));
    }

    #[tokio::test]
    async fn test_npmrc_written_next_to_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_package(temp_dir.path(), "pkg", r#"{"name": "pkg"}"#);
        let publisher = publisher(PublishOptions::default(), FakeRegistry::default());

        publisher.publish_one(&path).await.unwrap();

        let npmrc = std::fs::read_to_string(temp_dir.path().join("pkg").join(NPMRC_FILENAME)).unwrap();
        assert_eq!(npmrc, "registry=//reg.example.com\n_authToken=abc123");
    }

    #[tokio::test]
    async fn test_explicit_version_written_as_given() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_package(temp_dir.path(), "pkg", r#"{"name": "pkg", "version": "1.0.0"}"#);
        let publisher = publisher(
            PublishOptions {
                target_version: Some("v2.0.0".to_string()),
                ..Default::default()
            },
            FakeRegistry::default(),
        );

        let record = publisher.publish_one(&path).await.unwrap();

        assert_eq!(record.version, "v2.0.0");
        assert_eq!(read_version(&path), "v2.0.0");
    }
}
