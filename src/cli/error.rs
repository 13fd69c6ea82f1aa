//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, Outcome};
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),

    /// The failure has already been logged; only the exit code is left.
    #[error("{command} failed")]
    Reported { command: String, code: i32 },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl CliError {
    /// Already-logged failure of `command` ending in `outcome`.
    pub fn reported(command: &str, outcome: Outcome) -> Self {
        let code = match outcome {
            Outcome::Written { .. } => exitcode::OK,
            Outcome::FetchFailed => exitcode::UNAVAILABLE,
            Outcome::RenderFailed => exitcode::DATAERR,
            Outcome::WriteFailed => exitcode::IOERR,
        };
        CliError::Reported {
            command: command.to_string(),
            code,
        }
    }

    /// True if the error was logged where it happened and must not be printed again.
    pub fn is_reported(&self) -> bool {
        matches!(self, CliError::Reported { .. })
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Reported { code, .. } => *code,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Http { .. } => exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => exitcode::USAGE,
                    ApplicationError::Render { .. } => exitcode::DATAERR,
                    ApplicationError::Write { .. } => exitcode::IOERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                },
            },
        }
    }
}
