use thiserror::Error;

use crate::auth::AuthError;

/// Error type shared by the portal library.
///
/// Field validation failures are not errors; they travel as
/// [`crate::wizard::ValidationErrors`] data.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Incomplete form: {0}")]
    IncompleteForm(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;

/// Failure that ends the shell itself rather than a single command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Portal(PortalError::Io(err))
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl CliError {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input(_) => 2,
            _ => 1,
        }
    }
}
