//! The guarded configuration transaction.
//!
//! One [`Transaction`] drives one device through
//! `Idle → Locked → Loaded → Diffed → {Committed | Discarded | Failed}`:
//!
//! 1. open the private candidate database (private scope only)
//! 2. lock, unless locking was turned off; the exclusive scope always locks
//! 3. read or render the candidate and load it
//! 4. show the diff (a diff failure only warns)
//! 5. ask for confirmation, then commit or discard
//!
//! Whatever happens, cleanup runs afterwards: the lock is released if it
//! was taken and the private database is closed if it was opened. Cleanup
//! errors are reported but never change the outcome.

mod confirm;
mod database;
mod load;
mod report;

pub use confirm::{is_affirmative, AssumeYes, Confirmation, COMMIT_PROMPT};
pub use database::{ConfigDatabase, DatabaseError, DatabaseResult};
pub use load::{Candidate, CommitMode, ConfigFormat, LoadMode, LoadSource, LoadSpec};
pub use report::{Reporter, TransactionReport};

#[cfg(test)]
pub use confirm::MockConfirmation;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::template::{TemplateError, TemplateRenderer};

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Constructed, nothing sent yet
    Idle,
    /// Lock acquired, or locking skipped
    Locked,
    /// Candidate applied
    Loaded,
    /// Diff shown
    Diffed,
    /// Commit succeeded
    Committed,
    /// Operator declined
    Discarded,
    /// A step failed
    Failed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Idle => "idle",
            TransactionState::Locked => "locked",
            TransactionState::Loaded => "loaded",
            TransactionState::Diffed => "diffed",
            TransactionState::Committed => "committed",
            TransactionState::Discarded => "discarded",
            TransactionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that end a transaction, plus cleanup errors.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The lock (or the database scope) could not be acquired.
    #[error("Unable to lock configuration: {0}")]
    Lock(#[source] DatabaseError),

    /// The configuration or template file could not be read.
    #[error("Unable to open configuration file '{path}': {source}")]
    ConfigRead {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The template failed to render.
    #[error("Unable to render configuration template: {0}")]
    Render(#[source] TemplateError),

    /// The device rejected the candidate.
    #[error("Unable to load configuration: {0}")]
    Load(#[source] DatabaseError),

    /// The device rejected the commit.
    #[error("Unable to commit configuration: {0}")]
    Commit(#[source] DatabaseError),

    /// The lock could not be released.
    #[error("Unable to unlock configuration: {0}")]
    Unlock(#[source] DatabaseError),

    /// The database scope could not be closed.
    #[error("Unable to close configuration database: {0}")]
    CloseDatabase(#[source] DatabaseError),
}

impl From<TemplateError> for TransactionError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::Read { path, source } => TransactionError::ConfigRead { path, source },
            other => TransactionError::Render(other),
        }
    }
}

/// Transaction settings other than the candidate itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOptions {
    /// Candidate database scope
    pub commit_mode: CommitMode,
    /// Commit log comment
    pub comment: Option<String>,
    /// Take the configuration lock
    pub lock: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::default(),
            comment: None,
            lock: true,
        }
    }
}

/// Bookkeeping for what must be undone.
#[derive(Debug)]
struct Progress {
    state: TransactionState,
    lock_held: bool,
    database_open: bool,
}

/// One guarded configuration change.
pub struct Transaction<'a> {
    spec: LoadSpec,
    options: TransactionOptions,
    renderer: &'a dyn TemplateRenderer,
    confirmation: &'a dyn Confirmation,
    reporter: &'a dyn Reporter,
}

impl<'a> Transaction<'a> {
    /// Create a transaction; nothing is sent until [`Transaction::run`].
    pub fn new(
        spec: LoadSpec,
        options: TransactionOptions,
        renderer: &'a dyn TemplateRenderer,
        confirmation: &'a dyn Confirmation,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            spec,
            options,
            renderer,
            confirmation,
            reporter,
        }
    }

    /// Run to a terminal state, then clean up.
    pub async fn run(&self, db: &mut dyn ConfigDatabase) -> TransactionReport {
        let mut progress = Progress {
            state: TransactionState::Idle,
            lock_held: false,
            database_open: false,
        };

        let failure = match self.advance(db, &mut progress).await {
            Ok(()) => None,
            Err(err) => {
                info!(state = %progress.state, error = %err, "transaction failed");
                progress.state = TransactionState::Failed;
                self.reporter.failure(&err.to_string());
                Some(err)
            }
        };

        let cleanup_errors = self.release(db, &mut progress).await;

        info!(
            state = %progress.state,
            cleanup_errors = cleanup_errors.len(),
            "transaction finished"
        );
        TransactionReport {
            state: progress.state,
            failure,
            cleanup_errors,
            lock_held: progress.lock_held,
        }
    }

    async fn advance(
        &self,
        db: &mut dyn ConfigDatabase,
        progress: &mut Progress,
    ) -> Result<(), TransactionError> {
        db.open_database(self.options.commit_mode)
            .await
            .map_err(TransactionError::Lock)?;
        progress.database_open = self.options.commit_mode.opens_database();

        if self.options.lock || self.options.commit_mode.holds_lock() {
            self.reporter.step("Locking the configuration");
            db.lock().await.map_err(TransactionError::Lock)?;
            progress.lock_held = true;
        } else {
            debug!("locking skipped");
        }
        progress.state = TransactionState::Locked;

        if self.spec.source.is_template() {
            self.reporter.step("Loading configuration changes (from template)");
        } else {
            self.reporter.step("Loading configuration changes");
        }
        let candidate = self.candidate().await?;
        let ignored = db
            .load(&candidate, self.spec.mode, self.spec.ignore_warnings)
            .await
            .map_err(TransactionError::Load)?;
        for warning in ignored {
            self.reporter.warning(&format!("Ignored warning: {}", warning));
        }
        progress.state = TransactionState::Loaded;

        self.reporter.step("Candidate configuration:");
        match db.diff().await {
            Ok(diff) => self.reporter.diff(diff.as_deref()),
            Err(e) => self
                .reporter
                .warning(&format!("Unable to show configuration differences: {}", e)),
        }
        progress.state = TransactionState::Diffed;

        if !self.confirmation.confirm(COMMIT_PROMPT) {
            self.reporter.step("Not committing the changes");
            progress.state = TransactionState::Discarded;
            return Ok(());
        }

        self.reporter.step("Committing the configuration");
        db.commit(self.options.comment.as_deref())
            .await
            .map_err(TransactionError::Commit)?;
        progress.state = TransactionState::Committed;
        Ok(())
    }

    /// Read the literal file or render the template. Never both.
    async fn candidate(&self) -> Result<Candidate, TransactionError> {
        match &self.spec.source {
            LoadSource::File(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|source| {
                    TransactionError::ConfigRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                Ok(Candidate::new(text, path.clone()))
            }
            LoadSource::Template { path, vars } => {
                let text = self.renderer.render(path, vars)?;
                Ok(Candidate::new(text, path.clone()))
            }
        }
    }

    async fn release(
        &self,
        db: &mut dyn ConfigDatabase,
        progress: &mut Progress,
    ) -> Vec<TransactionError> {
        let mut errors = Vec::new();

        if progress.lock_held {
            self.reporter.step("Unlocking the configuration");
            match db.unlock().await {
                Ok(()) => progress.lock_held = false,
                Err(e) => {
                    let err = TransactionError::Unlock(e);
                    self.reporter.failure(&err.to_string());
                    errors.push(err);
                }
            }
        }

        if progress.database_open {
            match db.close_database().await {
                Ok(()) => progress.database_open = false,
                Err(e) => {
                    let err = TransactionError::CloseDatabase(e);
                    self.reporter.warning(&err.to_string());
                    errors.push(err);
                }
            }
        }

        errors
    }
}
