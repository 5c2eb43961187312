//! One cfgload invocation, end to end.
//!
//! Reads the variable file, resolves credentials, opens the session, runs
//! the configuration transaction and closes the session. Every failure is
//! reported through the [`Reporter`] and turned into an exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

use crate::connection::{ConnectOptions, Connector, Session};
use crate::credentials::CredentialResolver;
use crate::error::{Error, Result};
use crate::template::TemplateRenderer;
use crate::transaction::{
    CommitMode, Confirmation, LoadMode, LoadSource, LoadSpec, Reporter, Transaction,
    TransactionOptions, TransactionReport,
};

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Host identifier handed to the credential resolver
    pub host: String,
    /// Credentials file
    pub cfgfile: PathBuf,
    /// Configuration file or template
    pub loadfile: PathBuf,
    /// Variable file; its presence selects template mode
    pub varfile: Option<PathBuf>,
    /// Commit comment
    pub comment: Option<String>,
    /// Candidate database scope
    pub commit_mode: CommitMode,
    /// Load mode
    pub load_mode: LoadMode,
    /// Accept device warnings on load
    pub ignore_warnings: bool,
    /// Take the configuration lock
    pub lock: bool,
    /// Port override, wins over the credentials file
    pub port: Option<u16>,
}

/// The collaborators of a run.
pub struct Workflow {
    connector: Arc<dyn Connector>,
    resolver: Arc<dyn CredentialResolver>,
    renderer: Arc<dyn TemplateRenderer>,
    confirmation: Arc<dyn Confirmation>,
    reporter: Arc<dyn Reporter>,
    connect_options: ConnectOptions,
}

impl Workflow {
    /// Assemble a workflow.
    pub fn new(
        connector: Arc<dyn Connector>,
        resolver: Arc<dyn CredentialResolver>,
        renderer: Arc<dyn TemplateRenderer>,
        confirmation: Arc<dyn Confirmation>,
        reporter: Arc<dyn Reporter>,
        connect_options: ConnectOptions,
    ) -> Self {
        Self {
            connector,
            resolver,
            renderer,
            confirmation,
            reporter,
            connect_options,
        }
    }

    /// Run the request and return the process exit code.
    pub async fn run(&self, request: &LoadRequest) -> i32 {
        match self.execute(request).await {
            Ok(report) => report.exit_code(),
            Err(e) => {
                debug!(host = %request.host, error = %e, "run aborted before the transaction");
                self.reporter.failure(&e.operator_message());
                e.exit_code()
            }
        }
    }

    async fn execute(&self, request: &LoadRequest) -> Result<TransactionReport> {
        // Checked before anything touches the network
        let source = match &request.varfile {
            Some(varfile) => LoadSource::Template {
                path: request.loadfile.clone(),
                vars: read_varfile(varfile).await?,
            },
            None => LoadSource::File(request.loadfile.clone()),
        };

        let mut params = self.resolver.resolve(&request.cfgfile, &request.host)?;
        if request.port.is_some() {
            params.port = request.port;
        }

        let mut session = Session::new(
            params,
            Arc::clone(&self.connector),
            self.connect_options.clone(),
        );
        if let Err(e) = session.open().await {
            session.close().await;
            return Err(e.into());
        }

        self.reporter.step(&format!(
            "Connected to device {} (config mode: {}, load option: {})",
            request.host, request.commit_mode, request.load_mode
        ));

        let spec = LoadSpec {
            source,
            mode: request.load_mode,
            ignore_warnings: request.ignore_warnings,
        };
        let options = TransactionOptions {
            commit_mode: request.commit_mode,
            comment: request.comment.clone(),
            lock: request.lock,
        };
        let transaction = Transaction::new(
            spec,
            options,
            self.renderer.as_ref(),
            self.confirmation.as_ref(),
            self.reporter.as_ref(),
        );

        let report = transaction
            .run(&mut session)
            .instrument(info_span!("transaction", host = %request.host))
            .await;
        session.close().await;

        Ok(report)
    }
}

/// Read and parse the JSON variable file.
async fn read_varfile(path: &Path) -> Result<serde_json::Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::VarFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| Error::VarFileInvalid {
        path: path.to_path_buf(),
        source,
    })
}
