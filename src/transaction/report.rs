//! Operator-facing output channel and the outcome of a run.

use super::{TransactionError, TransactionState};

/// Where a transaction tells the operator what it is doing.
///
/// Passed in explicitly; the transaction never writes to the terminal on
/// its own.
pub trait Reporter: Send + Sync {
    /// Progress line, e.g. "Locking the configuration".
    fn step(&self, message: &str);

    /// Something went wrong but the run continues.
    fn warning(&self, message: &str);

    /// A named failure, e.g. "Unable to lock configuration".
    fn failure(&self, message: &str);

    /// Candidate vs. active configuration; `None` means no changes.
    fn diff(&self, diff: Option<&str>);
}

/// Outcome of [`Transaction::run`](super::Transaction::run).
#[derive(Debug)]
pub struct TransactionReport {
    /// Terminal state
    pub state: TransactionState,
    /// The error that ended the run, if any
    pub failure: Option<TransactionError>,
    /// Unlock / close-database errors during cleanup
    pub cleanup_errors: Vec<TransactionError>,
    /// Whether the lock is still held after cleanup
    pub lock_held: bool,
}

impl TransactionReport {
    /// Whether the run ended without a failure.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Process exit code for this outcome.
    ///
    /// Cleanup errors never change it: an unlock failure after a good
    /// commit still exits 0, and after a failed commit the commit error
    /// already decided 1.
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            crate::error::EXIT_FAILURE
        } else {
            crate::error::EXIT_SUCCESS
        }
    }
}
