use thiserror::Error;

use crate::types::TrackedId;

#[derive(Error, Debug)]
pub enum ArLinkError {
    #[error("Configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Registry dispatcher is no longer running")]
    DispatcherClosed,

    #[error("Script line {line}: {reason}")]
    Script { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract violations by whoever sources presence and scene events.
///
/// None of these are transient; a rejected operation leaves the registry
/// exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} is already tracked")]
    DuplicateId(TrackedId),

    #[error("{0} is not tracked")]
    UnknownId(TrackedId),

    #[error("Registry invariant violated: {reason}")]
    InvariantViolation { reason: String },
}
