//! Shared test utilities for the cfgload test suite.
//!
//! This module provides:
//! - `FakeDevice`: a `Transport` answering Junos RPCs and recording every one
//! - `FakeConnector`: hands out fake devices or fails with a chosen kind
//! - `StaticResolver`, `RecordingReporter`, `ScriptedConfirmation`
//! - Temporary file helpers
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use tempfile::TempDir;

use cfgload::app::{LoadRequest, Workflow};
use cfgload::connection::{
    ConnectError, ConnectOptions, Connector, SessionFacts, Transport, TransportResult,
};
use cfgload::credentials::{ConnectionParams, CredentialResolver, ResolveError, Secret};
use cfgload::template::JinjaRenderer;
use cfgload::transaction::{CommitMode, Confirmation, LoadMode, Reporter};
use cfgload::xml;

// ============================================================================
// Fake device
// ============================================================================

/// Everything the fake device saw.
#[derive(Debug, Default)]
pub struct DeviceLog {
    /// Short operation names, in order: open, lock, load, diff, commit, unlock, close-db
    pub ops: Vec<String>,
    /// Raw RPC bodies, in order
    pub requests: Vec<String>,
    /// Whether the configuration lock is held by the session
    pub locked: bool,
    /// Number of transport closes
    pub closes: usize,
}

impl DeviceLog {
    /// How often an operation was requested.
    pub fn count(&self, op: &str) -> usize {
        self.ops.iter().filter(|o| o.as_str() == op).count()
    }

    /// The first request for an operation.
    pub fn request(&self, op: &str) -> Option<&str> {
        self.ops
            .iter()
            .position(|o| o == op)
            .map(|i| self.requests[i].as_str())
    }
}

/// Behavior of a fake device.
#[derive(Debug, Clone, Default)]
pub struct DeviceScript {
    /// Operations that answer with an error-severity rpc-error
    pub failing: HashSet<&'static str>,
    /// Warning attached to the load reply
    pub load_warning: Option<String>,
    /// Diff text returned by the compare; `None` means no changes
    pub diff: Option<String>,
}

impl DeviceScript {
    /// A device that accepts everything and reports a small diff.
    pub fn healthy() -> Self {
        Self {
            diff: Some("[edit system]\n-  host-name r1-old;\n+  host-name r1;".to_string()),
            ..Default::default()
        }
    }

    /// Fail the given operations.
    pub fn failing(mut self, ops: &[&'static str]) -> Self {
        self.failing.extend(ops.iter().copied());
        self
    }

    /// Attach a warning to the load reply.
    pub fn with_load_warning(mut self, warning: &str) -> Self {
        self.load_warning = Some(warning.to_string());
        self
    }
}

/// A Junos device behind a `Transport`.
pub struct FakeDevice {
    script: DeviceScript,
    log: Arc<Mutex<DeviceLog>>,
    facts: SessionFacts,
}

impl FakeDevice {
    pub fn new(script: DeviceScript, log: Arc<Mutex<DeviceLog>>) -> Self {
        Self {
            script,
            log,
            facts: SessionFacts {
                session_id: Some(4242),
                capabilities: vec!["urn:ietf:params:netconf:base:1.0".to_string()],
            },
        }
    }

    fn op_name(request: &str) -> &'static str {
        match xml::root_name(request) {
            Some("open-configuration") => "open",
            Some("lock-configuration") => "lock",
            Some("load-configuration") => "load",
            Some("get-configuration") => "diff",
            Some("commit-configuration") => "commit",
            Some("unlock-configuration") => "unlock",
            Some("close-configuration") => "close-db",
            _ => "unknown",
        }
    }

    fn reply(&self, op: &str) -> String {
        if self.script.failing.contains(op) {
            return format!(
                "<rpc-reply><rpc-error><error-type>application</error-type>\
                 <error-tag>operation-failed</error-tag>\
                 <error-severity>error</error-severity>\
                 <error-message>{} refused by device</error-message></rpc-error></rpc-reply>",
                op
            );
        }

        match op {
            "load" => {
                let warning = self
                    .script
                    .load_warning
                    .as_ref()
                    .map(|w| {
                        format!(
                            "<rpc-error><error-severity>warning</error-severity>\
                             <error-message>{}</error-message></rpc-error>",
                            xml::escape(w)
                        )
                    })
                    .unwrap_or_default();
                format!(
                    "<rpc-reply><load-configuration-results>{}<ok/></load-configuration-results></rpc-reply>",
                    warning
                )
            }
            "diff" => format!(
                "<rpc-reply><configuration-information><configuration-output>{}</configuration-output></configuration-information></rpc-reply>",
                xml::escape(self.script.diff.as_deref().unwrap_or(""))
            ),
            "commit" => "<rpc-reply><commit-results><routing-engine><name>re0</name>\
                         <commit-success/></routing-engine></commit-results></rpc-reply>"
                .to_string(),
            _ => "<rpc-reply><ok/></rpc-reply>".to_string(),
        }
    }
}

#[async_trait]
impl Transport for FakeDevice {
    async fn rpc(&mut self, request: &str) -> TransportResult<String> {
        let op = Self::op_name(request);
        let reply = self.reply(op);
        let accepted = !self.script.failing.contains(op);

        let mut log = self.log.lock().unwrap();
        log.ops.push(op.to_string());
        log.requests.push(request.to_string());
        match op {
            "lock" if accepted => log.locked = true,
            "unlock" if accepted => log.locked = false,
            _ => {}
        }
        Ok(reply)
    }

    fn facts(&self) -> &SessionFacts {
        &self.facts
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

// ============================================================================
// Fake connector
// ============================================================================

/// How a fake connection attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    Timeout,
    Refused,
    Auth,
    Generic,
}

/// Connector that hands out [`FakeDevice`]s.
pub struct FakeConnector {
    script: DeviceScript,
    failure: Option<ConnectFailure>,
    pub log: Arc<Mutex<DeviceLog>>,
    attempts: AtomicUsize,
    last_port: Mutex<Option<u16>>,
}

impl FakeConnector {
    pub fn new(script: DeviceScript) -> Self {
        Self {
            script,
            failure: None,
            log: Arc::new(Mutex::new(DeviceLog::default())),
            attempts: AtomicUsize::new(0),
            last_port: Mutex::new(None),
        }
    }

    pub fn failing_with(failure: ConnectFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(DeviceScript::healthy())
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn last_port(&self) -> Option<u16> {
        *self.last_port.lock().unwrap()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        params: &ConnectionParams,
        options: &ConnectOptions,
    ) -> Result<Box<dyn Transport>, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.last_port.lock().unwrap() = Some(params.port.unwrap_or(options.port));

        let host = params.address.clone();
        match self.failure {
            Some(ConnectFailure::Timeout) => Err(ConnectError::Timeout {
                host,
                timeout_secs: options.timeout.as_secs(),
            }),
            Some(ConnectFailure::Refused) => Err(ConnectError::ConnectionRefused { host }),
            Some(ConnectFailure::Auth) => Err(ConnectError::AuthFailed {
                user: params.username.clone(),
                host,
                message: "permission denied".to_string(),
            }),
            Some(ConnectFailure::Generic) => Err(ConnectError::generic(host, "no route")),
            None => Ok(Box::new(FakeDevice::new(
                self.script.clone(),
                Arc::clone(&self.log),
            ))),
        }
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Resolver returning fixed parameters and counting lookups.
pub struct StaticResolver {
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialResolver for StaticResolver {
    fn resolve(&self, _cfgfile: &Path, host: &str) -> Result<ConnectionParams, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ConnectionParams {
            address: host.to_string(),
            port: None,
            username: "netops".to_string(),
            secret: Secret::Password(SecretString::from("s3cret".to_string())),
            proxy: None,
        })
    }
}

/// Reporter that keeps every line, prefixed by its kind.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.with_prefix("failure: ")
    }

    pub fn warnings(&self) -> Vec<String> {
        self.with_prefix("warning: ")
    }

    pub fn steps(&self) -> Vec<String> {
        self.with_prefix("step: ")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .iter()
            .filter_map(|l| l.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Reporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push(format!("step: {}", message));
    }

    fn warning(&self, message: &str) {
        self.push(format!("warning: {}", message));
    }

    fn failure(&self, message: &str) {
        self.push(format!("failure: {}", message));
    }

    fn diff(&self, diff: Option<&str>) {
        self.push(format!("diff: {}", diff.unwrap_or("<none>")));
    }
}

/// Confirmation with a fixed answer that counts questions.
pub struct ScriptedConfirmation {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedConfirmation {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirmation for ScriptedConfirmation {
    fn confirm(&self, _question: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A workflow wired to fakes, with handles to inspect them.
pub struct Harness {
    pub connector: Arc<FakeConnector>,
    pub resolver: Arc<StaticResolver>,
    pub confirmation: Arc<ScriptedConfirmation>,
    pub reporter: Arc<RecordingReporter>,
    pub workflow: Workflow,
}

impl Harness {
    pub fn new(connector: FakeConnector, answer: bool) -> Self {
        let connector = Arc::new(connector);
        let resolver = Arc::new(StaticResolver::new());
        let confirmation = Arc::new(ScriptedConfirmation::answering(answer));
        let reporter = Arc::new(RecordingReporter::default());
        let workflow = Workflow::new(
            connector.clone(),
            resolver.clone(),
            Arc::new(JinjaRenderer::new()),
            confirmation.clone(),
            reporter.clone(),
            ConnectOptions::default(),
        );
        Self {
            connector,
            resolver,
            confirmation,
            reporter,
            workflow,
        }
    }

    pub fn device(&self) -> std::sync::MutexGuard<'_, DeviceLog> {
        self.connector.log.lock().unwrap()
    }
}

// ============================================================================
// Files
// ============================================================================

/// Write `content` to `name` inside `dir`.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A request for `host` loading `loadfile` with defaults otherwise.
pub fn request(loadfile: PathBuf) -> LoadRequest {
    LoadRequest {
        host: "r1.example.net".to_string(),
        cfgfile: PathBuf::from("credentials.toml"),
        loadfile,
        varfile: None,
        comment: None,
        commit_mode: CommitMode::Shared,
        load_mode: LoadMode::Replace,
        ignore_warnings: false,
        lock: true,
        port: None,
    }
}
