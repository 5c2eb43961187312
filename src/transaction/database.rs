//! The device's candidate configuration database, as seen by a transaction.

use async_trait::async_trait;
use thiserror::Error;

use super::load::{Candidate, CommitMode, LoadMode};
use crate::connection::TransportError;
use crate::junos::NetconfError;

/// Errors from a single database operation.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The device answered with one or more `rpc-error`s.
    #[error("{}", join_errors(.0))]
    Rejected(Vec<NetconfError>),

    /// The conversation with the device failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request cannot be expressed for this device or format.
    #[error("{0}")]
    Unsupported(String),
}

fn join_errors(errors: &[NetconfError]) -> String {
    if errors.is_empty() {
        return "device rejected the request".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Operations the transaction performs against a device.
///
/// Implemented for [`crate::connection::Session`] over Junos XML RPCs.
#[async_trait]
pub trait ConfigDatabase: Send {
    /// Select the candidate database scope. `Shared` needs no device call.
    async fn open_database(&mut self, mode: CommitMode) -> DatabaseResult<()>;

    /// Take the configuration lock.
    async fn lock(&mut self) -> DatabaseResult<()>;

    /// Apply candidate text. Returns warnings that were accepted because
    /// `ignore_warnings` was set.
    async fn load(
        &mut self,
        candidate: &Candidate,
        mode: LoadMode,
        ignore_warnings: bool,
    ) -> DatabaseResult<Vec<String>>;

    /// Candidate vs. active configuration; `None` when there are no changes.
    async fn diff(&mut self) -> DatabaseResult<Option<String>>;

    /// Commit the candidate, with an optional log comment.
    async fn commit(&mut self, comment: Option<&str>) -> DatabaseResult<()>;

    /// Release the configuration lock.
    async fn unlock(&mut self) -> DatabaseResult<()>;

    /// Leave the scope opened by [`ConfigDatabase::open_database`].
    async fn close_database(&mut self) -> DatabaseResult<()>;
}
