//! Orchestration layer for workspace publishing
//!
//! This module ties the scanner, the registry configurator and the registry
//! client together into the per-manifest publishing loop.

pub mod package_publisher;
pub mod reporter;
pub mod workspace;

// Re-export main types for convenience
pub use package_publisher::{PackagePublisher, PublishOptions};
pub use reporter::ActionsReporter;
pub use workspace::publish_workspace;
