//! package.json loading and rewriting
//!
//! The document is kept as an ordered JSON object so that fields this tool
//! does not know about survive a rewrite untouched and in their original
//! order.

use crate::core::error::PublishError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Manifest file name looked up by the scanner
pub const MANIFEST_FILENAME: &str = "package.json";

/// A parsed package.json
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    path: PathBuf,
    name: String,
    document: Map<String, Value>,
}

impl PackageManifest {
    /// Parse manifest content read from `path`
    pub fn parse(path: &Path, content: &str) -> Result<Self, PublishError> {
        let parse_error = |message: String| PublishError::ManifestParse {
            path: path.to_path_buf(),
            message,
        };

        let document: Map<String, Value> =
            serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;

        let name = match document.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            Some(_) => return Err(parse_error("\"name\" must be a non-empty string".to_string())),
            None => return Err(parse_error("missing \"name\" field".to_string())),
        };

        Ok(Self {
            path: path.to_path_buf(),
            name,
            document,
        })
    }

    /// Read and parse the manifest at `path`
    pub async fn load(path: &Path) -> Result<Self, PublishError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PublishError::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::parse(path, &content)
    }

    /// Write the manifest back with two-space indentation
    pub async fn save(&self) -> Result<(), PublishError> {
        let write_error = |message: String| PublishError::ManifestWrite {
            path: self.path.clone(),
            message,
        };

        let mut content = serde_json::to_string_pretty(&self.document)
            .map_err(|e| write_error(e.to_string()))?;
        content.push('\n');

        fs::write(&self.path, content)
            .await
            .map_err(|e| write_error(e.to_string()))
    }

    /// Directory containing the manifest
    pub fn package_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current version, `None` if absent or not a string
    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    /// Replace the version field in place, keeping its position
    pub fn set_version(&mut self, version: &str) {
        self.document
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Scoped packages are named `@scope/name`
    pub fn is_scoped(&self) -> bool {
        self.name.starts_with('@')
    }
}
