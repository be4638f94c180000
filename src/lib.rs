pub mod core;
pub mod manifest;
pub mod orchestration;
pub mod registry;
pub mod scanner;
pub mod security;

pub use crate::core::*;
pub use orchestration::{ActionsReporter, PackagePublisher, PublishOptions, publish_workspace};
pub use registry::{NpmCli, RegistryConfig, RegistryConfigurator};
pub use scanner::ManifestScanner;
pub use security::{Credential, SafeCommandExecutor, SecretMasker};
