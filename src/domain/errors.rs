//! Domain errors for the dateinsert reconciliation engine.

use std::path::PathBuf;

use thiserror::Error;

fn display_candidate(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "no candidate".to_string(), |p| p.display().to_string())
}

/// Errors reported by a UI driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("Stale element reference: {0}")]
    Stale(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Driver timeout: {0}")]
    Timeout(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("UI driver unreachable: {0}")]
    Unreachable(String),

    #[error("Driver protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// The driver process or session is gone; nothing else can succeed.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost(_) | Self::Unreachable(_))
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Item-local errors raised while reconciling one photo.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Could not parse {what}: {text:?}")]
    Parse { what: &'static str, text: String },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ReconcileError {
    pub fn parse(what: &'static str, text: impl Into<String>) -> Self {
        Self::Parse {
            what,
            text: text.into(),
        }
    }
}

/// Errors that terminate a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Redirected to a sign-in page ({url}); the browser profile is not logged in")]
    AuthenticationRedirect { url: String },

    #[error("Required executable not found: {what} ({})", display_candidate(.path))]
    MissingBinary {
        what: String,
        path: Option<PathBuf>,
    },

    #[error("Failed to start the browser session: {0}")]
    SessionStart(String),

    #[error("Interrupted")]
    Interrupted,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_driver_errors() {
        assert!(DriverError::Unreachable("refused".into()).is_fatal());
        assert!(DriverError::SessionLost("invalid session id".into()).is_fatal());
        assert!(!DriverError::Stale("x".into()).is_fatal());
        assert!(!DriverError::NoSuchElement("x".into()).is_fatal());
    }

    #[test]
    fn test_missing_binary_message() {
        let err = RunError::MissingBinary {
            what: "geckodriver".into(),
            path: Some(PathBuf::from("/opt/geckodriver")),
        };
        assert!(err.to_string().contains("/opt/geckodriver"));

        let err = RunError::MissingBinary {
            what: "firefox".into(),
            path: None,
        };
        assert!(err.to_string().contains("no candidate"));
    }
}
