use thiserror::Error;

use crate::app::errors::AppError;

/// Errors raised while handling a CLI command
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
