//! Error types shared by every layer of the harness.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("{message}: expected {expected:?}, actual {actual:?}")]
    AssertionFailed {
        message: String,
        expected: String,
        actual: String,
    },

    #[error("timed out after {waited_ms} ms waiting for {description}")]
    Timeout { description: String, waited_ms: u64 },

    #[error("no element matches {locator}")]
    NoMatch { locator: String },

    #[error("{count} elements match {locator}, expected exactly one")]
    Ambiguous { locator: String, count: usize },

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unknown fixture: {0}")]
    UnknownFixture(String),

    #[error("fixture error: {0}")]
    Fixture(String),

    #[error("action rejected: {0}")]
    Action(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// The two ways a scenario can fail, as far as a report is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Assertion,
    Timeout,
}

impl HarnessError {
    pub fn assertion(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        HarnessError::AssertionFailed {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Resolution failures count as assertions: a missing element is a
    /// mismatch between expected and rendered DOM.
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::Assertion,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }
}
