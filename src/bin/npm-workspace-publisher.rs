//! npm-workspace-publisher CLI
//!
//! Publishes every package.json found in a workspace to an npm registry

use anyhow::Result;
use clap::Parser;
use clap::builder::FalseyValueParser;
use npm_workspace_publisher::{
    ActionConfig, ActionsReporter, NpmAccess, NpmCli, publish_workspace,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Publish every package of a workspace to an npm registry
#[derive(Parser, Debug)]
#[command(name = "npm-workspace-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish workspace packages to an npm registry", long_about = None)]
struct Cli {
    /// Registry to publish to
    #[arg(long, env = "INPUT_REGISTRY")]
    registry: Option<String>,

    /// Comma-separated directories to scan, relative to the workspace
    #[arg(long, env = "INPUT_SCAN", default_value = ".")]
    scan: String,

    /// Comma-separated lines added to every .npmrc
    #[arg(long, env = "INPUT_NPMRC-OPTIONS", default_value = "")]
    npmrc_options: String,

    /// Version given to every package instead of bumping
    #[arg(long, env = "TAG")]
    target_version: Option<String>,

    /// Publishing a single element (ignores the target version)
    #[arg(long, env = "INPUT_SINGLE-ELEMENT", value_parser = FalseyValueParser::new())]
    single_element: bool,

    /// Access level for scoped packages
    #[arg(long, env = "INPUT_ACCESS", value_enum)]
    access: Option<NpmAccess>,

    /// Workspace root
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Registry access token
    #[arg(long, env = "REGISTRY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Registry user:password credentials
    #[arg(long, env = "REGISTRY_CREDENTIALS", hide_env_values = true)]
    credentials: Option<String>,

    /// File receiving run outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Emit workflow-command annotations
    #[arg(long, env = "GITHUB_ACTIONS", value_parser = FalseyValueParser::new())]
    annotations: bool,

    /// Timeout in seconds for each npm command
    #[arg(long, env = "INPUT_COMMAND-TIMEOUT")]
    command_timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<ActionConfig> {
        let workspace = match self.workspace {
            Some(workspace) => workspace,
            None => std::env::current_dir()?,
        };

        Ok(ActionConfig {
            token: self.token.map(|t| SecretString::new(t.into())),
            credentials: self.credentials.map(|c| SecretString::new(c.into())),
            registry: ActionConfig::registry_or_default(self.registry.as_deref()),
            workspace,
            scan_dirs: ActionConfig::split_list(&self.scan),
            npmrc_options: ActionConfig::split_options(&self.npmrc_options),
            target_version: ActionConfig::target_version_from(self.target_version.as_deref()),
            single_element: self.single_element,
            access: self.access,
            command_timeout: self.command_timeout.map(Duration::from_secs),
            output_file: self.output_file,
            annotations: self.annotations,
        })
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Console logging controlled by RUST_LOG (default: info)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run() -> Result<i32> {
    let config = Cli::parse().into_config()?;
    let reporter = ActionsReporter::new(config.annotations, config.output_file.clone());
    let timeout = config.command_timeout;

    match publish_workspace(&config, &reporter, |masker| {
        NpmCli::new(timeout, masker.clone())
    })
    .await
    {
        Ok(summary) => {
            reporter.set_output("modules", &summary.modules())?;
            println!(
                "\n✅ Published {} package(s), {} failed",
                summary.publications.len(),
                summary.failures.len()
            );
            Ok(0)
        }
        Err(e) => {
            reporter.error(&format!("[{}] {}", e.code(), e));
            for action in e.suggested_actions() {
                eprintln!("  - {}", action);
            }
            Ok(1)
        }
    }
}
