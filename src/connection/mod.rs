//! Connection layer for device management sessions.
//!
//! This module owns everything between resolved [`ConnectionParams`] and a
//! NETCONF conversation with the device.
//!
//! # Overview
//!
//! - [`Connector`] establishes one authenticated transport per call. The
//!   production implementation is [`ssh::SshConnector`] (russh + the
//!   `netconf` SSH subsystem).
//! - [`Transport`] is a live NETCONF conversation: send an RPC body, receive
//!   the reply document.
//! - [`Session`] ties the two together and gives the transaction layer an
//!   open/close lifecycle with idempotent close.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cfgload::connection::{ConnectOptions, Session, ssh::SshConnector};
//!
//! let mut session = Session::new(params, Arc::new(SshConnector::new()), ConnectOptions::default());
//! session.open().await?;
//! // ... run a transaction ...
//! session.close().await;
//! ```

pub mod jump_host;
pub mod netconf;
pub mod session;
pub mod ssh;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::HostKeyChecking;
use crate::credentials::ConnectionParams;

pub use session::Session;

/// Default NETCONF-over-SSH port used when neither the credentials nor the
/// settings name one.
pub const DEFAULT_PORT: u16 = 22;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

/// Errors raised while establishing a session.
///
/// `open()` makes a single attempt; each variant maps to one operator-facing
/// message (see [`ConnectError::operator_message`]).
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The device rejected the supplied credentials.
    #[error("Authentication failed for '{user}@{host}': {message}")]
    AuthFailed {
        /// Username presented to the device
        user: String,
        /// Target host
        host: String,
        /// Error message
        message: String,
    },

    /// The TCP connection was actively refused.
    #[error("Connection to '{host}' refused")]
    ConnectionRefused {
        /// Target host
        host: String,
    },

    /// The device did not answer within the connect timeout.
    #[error("Connection to '{host}' timed out after {timeout_secs} seconds")]
    Timeout {
        /// Target host
        host: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    /// Any other failure while connecting (handshake, host key, subsystem).
    #[error("Failed to connect to '{host}': {message}")]
    Generic {
        /// Target host
        host: String,
        /// Error message
        message: String,
    },
}

impl ConnectError {
    /// Creates a generic connect error.
    pub fn generic(host: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Generic {
            host: host.into(),
            message: message.to_string(),
        }
    }

    /// Short, kind-specific message shown to the operator.
    pub fn operator_message(&self) -> &'static str {
        match self {
            ConnectError::AuthFailed { .. } => "Authentication failed.",
            ConnectError::ConnectionRefused { .. } => "Connection refused.",
            ConnectError::Timeout { .. } => "Connection timed out.",
            ConnectError::Generic { .. } => "Connection failed.",
        }
    }
}

/// Errors on an already-open transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No transport is open on this session.
    #[error("Session is not open")]
    NotOpen,

    /// The device closed the conversation.
    #[error("Connection closed by device")]
    Closed,

    /// I/O failure on the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The device sent something that is not a NETCONF message.
    #[error("Malformed NETCONF message: {0}")]
    Malformed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Facts learned from the device's NETCONF hello.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFacts {
    /// Session id assigned by the device
    pub session_id: Option<u32>,
    /// Capabilities advertised by the device
    pub capabilities: Vec<String>,
}

impl SessionFacts {
    /// Check if a capability is advertised.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c.contains(capability))
    }
}

/// A live NETCONF conversation with one device.
#[async_trait]
pub trait Transport: Send {
    /// Send one RPC body (the content of `<rpc>`) and wait for the reply document.
    async fn rpc(&mut self, request: &str) -> TransportResult<String>;

    /// Facts from the session hello.
    fn facts(&self) -> &SessionFacts;

    /// Close the conversation and release the underlying connection.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Establishes transports to devices.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticate and open a NETCONF transport. Exactly one attempt.
    async fn connect(
        &self,
        params: &ConnectionParams,
        options: &ConnectOptions,
    ) -> Result<Box<dyn Transport>, ConnectError>;
}

/// Connection settings that do not come from the credentials file.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Port used when the credentials do not name one
    pub port: u16,
    /// Timeout for TCP connect, SSH handshake and NETCONF hello
    pub timeout: Duration,
    /// Host key verification policy
    pub host_key_checking: HostKeyChecking,
    /// known_hosts file consulted by the host key policy
    pub known_hosts_file: PathBuf,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            host_key_checking: HostKeyChecking::default(),
            known_hosts_file: crate::config::default_known_hosts_file(),
        }
    }
}
