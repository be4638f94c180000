//! Per-package `.npmrc` generation
//!
//! A fresh file lists the passthrough options, the registry and the auth
//! line. An existing file is merged: every scoped registry line is rebound to
//! the resolved credential, keeping its scope.

use crate::core::error::PublishError;
use crate::security::{Credential, SecretMasker};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Registry configuration file read by npm
pub const NPMRC_FILENAME: &str = ".npmrc";

lazy_static! {
    /// `//host[:port]/path/:key=value`, capturing the scope
    static ref SCOPED_LINE: Regex =
        Regex::new(r"^\s*(//\S+?):[A-Za-z_][A-Za-z0-9_-]*\s*=").unwrap();
}

/// Canonical `//host/path/` form npm uses to scope credentials
///
/// # Examples
///
/// ```
/// use npm_workspace_publisher::registry::nerf_dart;
///
/// assert_eq!(nerf_dart("https://npm.pkg.github.com"), "//npm.pkg.github.com/");
/// assert_eq!(nerf_dart("//registry.npmjs.org"), "//registry.npmjs.org/");
/// ```
pub fn nerf_dart(url: &str) -> String {
    let url = url.trim();
    let without_scheme = url
        .strip_prefix("https:")
        .or_else(|| url.strip_prefix("http:"))
        .unwrap_or(url);

    let mut nerfed = if without_scheme.starts_with("//") {
        without_scheme.to_string()
    } else {
        format!("//{}", without_scheme)
    };
    if !nerfed.ends_with('/') {
        nerfed.push('/');
    }
    nerfed
}

/// Registry settings shared by every package of a run
#[derive(Debug)]
pub struct RegistryConfig {
    pub registry_url: String,
    pub credential: Credential,
    pub extra_options: Vec<String>,
}

/// Writes `.npmrc` files for package directories
#[derive(Debug)]
pub struct RegistryConfigurator {
    config: RegistryConfig,
    masker: SecretMasker,
}

impl RegistryConfigurator {
    pub fn new(config: RegistryConfig) -> Self {
        let masker = SecretMasker::new([(
            config.credential.expose(),
            config.credential.placeholder(),
        )]);

        Self { config, masker }
    }

    /// Masker hiding the credential of this configuration
    pub fn masker(&self) -> &SecretMasker {
        &self.masker
    }

    fn auth_line(&self, scope: &str) -> String {
        format!(
            "{}{}={}",
            scope,
            self.config.credential.auth_key(),
            self.config.credential.expose()
        )
    }

    fn options(&self) -> impl Iterator<Item = &str> {
        self.config
            .extra_options
            .iter()
            .map(|option| option.trim())
            .filter(|option| !option.is_empty())
    }

    /// Content for a directory without an `.npmrc`
    pub fn compose_fresh(&self) -> String {
        let mut lines: Vec<String> = self.options().map(str::to_string).collect();
        lines.push(format!("registry={}", self.config.registry_url));
        lines.push(self.auth_line(""));
        lines.join("\n")
    }

    /// Content for a directory whose `.npmrc` already holds `existing`.
    ///
    /// Applying this to its own output yields the same content.
    pub fn merge_existing(&self, existing: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut first_registry_line = None;
        let mut has_scoped_line = false;
        let options: Vec<&str> = self.options().collect();

        for line in existing.lines() {
            // passthrough options may themselves be scoped; they stay verbatim
            let is_option = options.contains(&line.trim());

            if let Some(captures) = SCOPED_LINE.captures(line).filter(|_| !is_option) {
                has_scoped_line = true;
                first_registry_line.get_or_insert(lines.len());

                let rewritten = self.auth_line(&format!("{}:", &captures[1]));
                if !lines.contains(&rewritten) {
                    lines.push(rewritten);
                }
                continue;
            }

            if line.trim_start().starts_with("registry=") {
                first_registry_line.get_or_insert(lines.len());
            }
            lines.push(line.to_string());
        }

        let missing_options: Vec<String> = options
            .iter()
            .filter(|option| !lines.iter().any(|line| line.trim() == **option))
            .map(|option| option.to_string())
            .collect();
        let insert_at = first_registry_line.unwrap_or(lines.len());
        lines.splice(insert_at..insert_at, missing_options);

        if !has_scoped_line {
            let scope = format!("{}:", nerf_dart(&self.config.registry_url));
            lines.push(self.auth_line(&scope));
        }

        let mut merged = lines.join("\n");
        if existing.ends_with('\n') {
            merged.push('\n');
        }
        merged
    }

    /// Write `.npmrc` into `dir`, merging with an existing file.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::ConfigurationWrite` on any filesystem failure.
    pub async fn configure(&self, dir: &Path) -> Result<PathBuf, PublishError> {
        let path = dir.join(NPMRC_FILENAME);
        let write_error = |e: std::io::Error| PublishError::ConfigurationWrite {
            path: path.clone(),
            message: e.to_string(),
        };

        let content = match fs::read_to_string(&path).await {
            Ok(existing) => {
                debug!(path = %path.display(), "merging into existing npmrc");
                let merged = self.merge_existing(&existing);
                fs::remove_file(&path).await.map_err(write_error)?;
                merged
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.compose_fresh(),
            Err(e) => return Err(write_error(e)),
        };

        info!(
            "Writing to {}\nnpmrc content:\n{}\n------",
            path.display(),
            self.masker.mask(&content)
        );

        fs::write(&path, &content).await.map_err(write_error)?;
        Ok(path)
    }
}
