use thiserror::Error;

use crate::loader::LoadError;
use crate::tree::NodeId;

/// Configuration errors.
///
/// Raised synchronously to the caller for misuse of the declaration and
/// registration APIs or for unreadable configuration files. These never
/// appear in the event stream.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Expected test name to be a non-empty string")]
    EmptyName,

    #[error("Expected `only` selector to have at least one segment")]
    EmptySelector,

    #[error("Reporters may only be added to the root.")]
    ReporterNotRoot,

    #[error("A reporter is already registered on this suite.")]
    ReporterExists,

    #[error("Can't modify the suite while tests are running.")]
    Locked,

    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by [`Suite::run`](crate::Suite::run) and
/// [`Suite::load`](crate::Suite::load).
///
/// Test-level failures are never returned here; they travel through the
/// event stream.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Can't run while tests are already running.")]
    Concurrency,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
