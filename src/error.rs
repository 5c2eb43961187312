//! Error types for cfgload.
//!
//! Each layer owns its error enum (`ResolveError`, `ConnectError`,
//! `TransactionError`, ...). [`Error`] collects the ones that can end a run
//! before the transaction starts, and maps every kind to a short operator
//! message and an exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::connection::ConnectError;
use crate::credentials::ResolveError;

/// Exit code for a committed or deliberately discarded change.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for every named error.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for usage errors (reported by clap).
pub const EXIT_USAGE: i32 = 2;

/// Result type alias for cfgload operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for cfgload.
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials for the host could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The session could not be opened.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The variable file could not be read.
    #[error("Unable to open {}: {source}", path.display())]
    VarFileUnreadable {
        /// Variable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The variable file is not valid JSON.
    #[error("Invalid JSON in {}: {source}", path.display())]
    VarFileInvalid {
        /// Variable file
        path: PathBuf,
        /// Parser error, with line and column
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Short, kind-specific message shown to the operator.
    pub fn operator_message(&self) -> String {
        match self {
            Error::Resolve(e) => e.to_string(),
            Error::Connect(e) => e.operator_message().to_string(),
            Error::VarFileUnreadable { path, .. } => format!("Unable to open {}", path.display()),
            Error::VarFileInvalid { path, .. } => format!("Invalid JSON in {}", path.display()),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}
