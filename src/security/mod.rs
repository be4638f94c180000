pub mod command_executor;
pub mod credential;
pub mod masking;

pub use command_executor::{CommandError, CommandOutput, SafeCommandExecutor};
pub use credential::Credential;
pub use masking::SecretMasker;
