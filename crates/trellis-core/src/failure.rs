use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::assert::AssertionError;
use crate::error::ConfigError;

/// Outcome of a test body or hook.
pub type TestResult = Result<(), Failure>;

/// Why a node failed.
///
/// Assertion failures and arbitrary errors are kept verbatim; timeouts,
/// panics and dropped completion handles are synthesized by the runner.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("Timeout of {}ms reached", .0.as_millis())]
    Timeout(Duration),

    #[error("Test panicked: {0}")]
    Panic(String),

    #[error("Completion handle dropped without a result")]
    Dropped,

    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Other(Arc<dyn StdError + Send + Sync>),
}

impl Failure {
    /// Wraps any error, keeping it as the failure payload.
    pub fn other<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure::Other(Arc::new(err))
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Failure::Message(msg.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Failure::Panic(msg)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Failure::Timeout(_))
    }

    pub fn as_assertion(&self) -> Option<&AssertionError> {
        match self {
            Failure::Assertion(err) => Some(err),
            _ => None,
        }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Assertion(_) => "assertion",
            Failure::Timeout(_) => "timeout",
            Failure::Panic(_) => "panic",
            Failure::Dropped => "dropped",
            Failure::Message(_) => "message",
            Failure::Other(_) => "error",
        }
    }
}

impl From<ConfigError> for Failure {
    fn from(err: ConfigError) -> Self {
        Failure::other(err)
    }
}

impl From<String> for Failure {
    fn from(msg: String) -> Self {
        Failure::Message(msg)
    }
}

impl From<&str> for Failure {
    fn from(msg: &str) -> Self {
        Failure::Message(msg.to_string())
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Failure::Assertion(err) => {
                let mut state = serializer.serialize_struct("Failure", 3)?;
                state.serialize_field("kind", self.kind())?;
                state.serialize_field("message", &err.message)?;
                state.serialize_field("assertion", err)?;
                state.end()
            }
            _ => {
                let mut state = serializer.serialize_struct("Failure", 2)?;
                state.serialize_field("kind", self.kind())?;
                state.serialize_field("message", &self.to_string())?;
                state.end()
            }
        }
    }
}
