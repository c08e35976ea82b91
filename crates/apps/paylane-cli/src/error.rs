//! CLI error types.

use paylane_types::{ErrorCategory, ErrorCode};
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Orchestrator error.
    #[error("{0}")]
    Ops(#[from] paylane_ops::OpsError),

    /// Licensing error.
    #[error("{0}")]
    License(#[from] paylane_license::LicenseError),

    /// Store error.
    #[error("{0}")]
    Store(#[from] paylane_store::StoreError),

    /// Payment rail error.
    #[error("{0}")]
    Rail(#[from] paylane_settle::RailError),

    /// Gateway error.
    #[error("{0}")]
    Gate(#[from] paylane_gate::GateError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),

    /// Agent identity missing from configuration.
    #[error("Agent identity not configured. Set agent.identity in config.toml or pass --as.")]
    AgentNotConfigured,
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) | Self::AgentNotConfigured => 3,
            // IO errors: 9
            Self::Io(_) => 9,
            // Everything else by protocol category
            _ => match self.error_code().category() {
                ErrorCategory::Validation => 1,
                ErrorCategory::NotFound => 2,
                ErrorCategory::Authorization => 4,
                ErrorCategory::Budget => 5,
                ErrorCategory::Rail => 7,
                ErrorCategory::Internal => 8,
            },
        }
    }

    /// Get the protocol error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Ops(e) => e.error_code(),
            Self::License(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Rail(e) => e.error_code(),
            Self::Gate(e) => e.error_code(),
            Self::User(_) => ErrorCode::InvalidRequest,
            Self::AgentNotConfigured => ErrorCode::InvalidIdentity,
            Self::Config(_) | Self::Toml(_) | Self::Io(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Get a user-facing suggestion, if any.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Ops(e) => e.suggestion(),
            Self::License(e) => e.suggestion(),
            Self::Store(e) => e.suggestion(),
            Self::Rail(e) => e.suggestion(),
            Self::Gate(e) => e.suggestion(),
            Self::Toml(_) => Some("Check the syntax of config.toml."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylane_ops::{BudgetError, OpsError};
    use paylane_types::Fingerprint;

    #[test]
    fn test_exit_codes_follow_category() {
        let not_found: CliError =
            paylane_license::LicenseError::NotFound(Fingerprint::of(b"x")).into();
        assert_eq!(not_found.exit_code(), 2);

        let budget: CliError = OpsError::Budget(BudgetError::Overflow).into();
        assert_eq!(budget.exit_code(), 5);

        let rail: CliError = paylane_settle::RailError::network("down").into();
        assert_eq!(rail.exit_code(), 7);

        assert_eq!(CliError::config("bad").exit_code(), 3);
        assert_eq!(CliError::user("nope").exit_code(), 1);
    }

    #[test]
    fn test_suggestions_delegate() {
        let err: CliError = OpsError::invalid_request("no fingerprints given").into();
        assert_eq!(err.suggestion(), ErrorCode::InvalidRequest.suggestion());

        let err: CliError = paylane_settle::RailError::insufficient_balance(1, 2).into();
        assert_eq!(err.suggestion(), ErrorCode::InsufficientBalance.suggestion());
    }
}
