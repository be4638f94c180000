//! Run reporting for CI
//!
//! Warnings and errors are logged, and when annotations are enabled also
//! echoed as `::warning::`/`::error::` workflow commands. Run outputs are
//! appended to the CI output file as `name=value` lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Escape a message for use in a workflow command
fn escape_command_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Reports warnings, errors and run outputs to the CI runner
#[derive(Debug, Clone, Default)]
pub struct ActionsReporter {
    annotations: bool,
    output_file: Option<PathBuf>,
}

impl ActionsReporter {
    pub fn new(annotations: bool, output_file: Option<PathBuf>) -> Self {
        Self {
            annotations,
            output_file,
        }
    }

    /// Non-fatal problem
    pub fn warning(&self, message: &str) {
        warn!("{}", message);
        if self.annotations {
            println!("::warning::{}", escape_command_data(message));
        }
    }

    /// Run-level failure
    pub fn error(&self, message: &str) {
        error!("{}", message);
        if self.annotations {
            println!("::error::{}", escape_command_data(message));
        }
    }

    /// Record a run output.
    ///
    /// Without an output file the value is only logged.
    pub fn set_output(&self, name: &str, value: &str) -> std::io::Result<()> {
        info!("{}: {}", name, value);

        let Some(path) = &self.output_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if value.contains('\n') {
            let delimiter = format!("ghadelimiter_{}", std::process::id());
            writeln!(file, "{}<<{}\n{}\n{}", name, delimiter, value, delimiter)
        } else {
            writeln!(file, "{}={}", name, value)
        }
    }
}
