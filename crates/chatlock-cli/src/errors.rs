//! CLI error types for structured error handling.
//!
//! Core failures are classified here so every command exits with the same
//! code for the same kind of problem.

use std::fmt;

use chatlock_core::LockError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, view, locked entry)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong PIN, no PIN, folder still locked)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and optional hint.
    pub fn auth_failed(message: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }
}

impl From<LockError> for CliError {
    fn from(err: LockError) -> Self {
        let message = err.to_string();
        match err {
            LockError::PinNotSet => CliError::auth_failed_with_hint(
                message,
                "Hint: Run `chatlock pin set` first.",
            ),
            LockError::WrongPin | LockError::Crypto(_) => CliError::auth_failed(message),
            LockError::FolderLocked => CliError::auth_failed_with_hint(
                message,
                "Hint: Enter the PIN when `chatlock folder` asks for it.",
            ),
            LockError::NotFound(_) => CliError::not_found(
                message,
                "Hint: Run `chatlock folder --view <FILE>` to list locked chats.",
            ),
            _ => CliError::InvalidInput(message),
        }
    }
}

/// Exit code for any error surfaced from a command.
///
/// Core errors that were not converted yet are classified on the way out;
/// anything else is a general failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(core) = err.downcast_ref::<LockError>() {
        return match core {
            LockError::Persistence(_) | LockError::Io { .. } | LockError::Json { .. } => 1,
            LockError::PinNotSet
            | LockError::WrongPin
            | LockError::Crypto(_)
            | LockError::FolderLocked => exit_codes::AUTH_FAILED,
            LockError::NotFound(_) => exit_codes::NOT_FOUND,
            _ => exit_codes::INVALID_INPUT,
        };
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_pin_is_auth_failure() {
        let err = CliError::from(LockError::WrongPin);
        assert_eq!(err.exit_code(), exit_codes::AUTH_FAILED);
        assert_eq!(err.to_string(), "Incorrect PIN.");
    }

    #[test]
    fn test_pin_not_set_carries_hint() {
        let err = CliError::from(LockError::PinNotSet);
        assert!(err.to_string().contains("chatlock pin set"));
    }

    #[test]
    fn test_not_found_exit_code() {
        let err = CliError::from(LockError::NotFound("abc".to_string()));
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
    }

    #[test]
    fn test_exit_code_for_raw_core_error() {
        let err = anyhow::Error::new(LockError::EmptyCapture);
        assert_eq!(exit_code_for(&err), exit_codes::INVALID_INPUT);
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
