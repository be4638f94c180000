//! SafeCommandExecutor: whitelisted execution of the registry tool
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: Optional, off unless configured
//!
//! # Example
//!
//! ```rust,no_run
//! use npm_workspace_publisher::security::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! executor.set_timeout(Duration::from_secs(30));
//!
//! let output = executor.execute("npm", &["--version"]).await?;
//! println!("{}", output.combined());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
const ALLOWED_COMMANDS: &[&str] = &["npm"];

/// Marker the npm CLI prints in front of error lines.
///
/// npm can print errors while still exiting with status 0, so the marker is
/// authoritative on its own. npm 10 prints `npm error` instead; that wording
/// is not matched.
pub const NPM_ERROR_MARKER: &str = "npm ERR!";

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be spawned (binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Non-zero exit or the npm error marker anywhere in the output
    pub fn is_failure(&self) -> bool {
        !self.success
            || self.stdout.contains(NPM_ERROR_MARKER)
            || self.stderr.contains(NPM_ERROR_MARKER)
    }
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Execute a whitelisted command and capture its output.
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// [`CommandOutput::is_failure`].
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::Timeout` - Timeout configured and exceeded
    pub async fn execute(&self, command: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // npm is a .cmd shim on Windows
        #[cfg(target_os = "windows")]
        let command_name = format!("{}.cmd", command);

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        tracing::debug!(
            command = %command_name,
            args = ?args,
            dir = %self.working_dir.display(),
            "executing command"
        );

        let child = Command::new(&command_name)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child)
                .await
                .map_err(|_| CommandError::Timeout(timeout))?,
            None => child.await,
        }
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
