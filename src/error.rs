//! Error taxonomy for the parameter compiler.
//!
//! Every failure is fatal for the run. The only recovery path is fixing the
//! input files and running again.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling network parameters.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing JSON, or a required field of the wrong shape.
    #[error("configuration error: {0}")]
    Config(String),

    /// Aggregated validator report, one message per violation.
    #[error("{} validation error(s):\n  - {}", .0.len(), .0.join("\n  - "))]
    Validation(Vec<String>),

    /// A requested subnet block does not fit in any remaining range.
    #[error("subnet '{name}' (alias '{alias}', /{prefix_length}) does not fit in vnetAddressPrefixes")]
    Allocation {
        name: String,
        alias: String,
        prefix_length: u8,
    },

    /// An alias, token, selector or next hop could not be resolved.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Missing driver input, e.g. an unset environment variable.
    #[error("usage error: {0}")]
    Usage(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit status for this error: 2 for usage errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) => 2,
            _ => 1,
        }
    }

    pub(crate) fn resolution(msg: impl Into<String>) -> Self {
        Error::Resolution(msg.into())
    }
}
