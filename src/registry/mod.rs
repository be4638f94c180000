pub mod npm_cli;
pub mod npmrc;

pub use npm_cli::NpmCli;
pub use npmrc::{NPMRC_FILENAME, RegistryConfig, RegistryConfigurator, nerf_dart};
