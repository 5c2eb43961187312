//! # cfgload - guarded configuration loads for Junos devices
//!
//! cfgload pushes one configuration change to one device over NETCONF and
//! never leaves the configuration locked behind it:
//!
//! ```text
//! resolve credentials -> open session -> lock -> load -> diff
//!     -> confirm -> commit | discard -> unlock -> close session
//! ```
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   CLI (clap, prompts, output)                │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │       Workflow: var file, credentials, session, transaction  │
//! └──────────────────────────────────────────────────────────────┘
//!          │                    │                       │
//!          ▼                    ▼                       ▼
//! ┌─────────────────┐ ┌──────────────────────┐ ┌──────────────────┐
//! │   Credentials   │ │     Transaction      │ │    Templates     │
//! │ (flat / CSV     │ │ (lock/load/diff/     │ │ (minijinja)      │
//! │  inventory)     │ │  confirm/commit)     │ │                  │
//! └─────────────────┘ └──────────────────────┘ └──────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │     Junos RPCs over a Session (NETCONF 1.0 over russh)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cfgload::prelude::*;
//!
//! let workflow = Workflow::new(
//!     Arc::new(SshConnector::default()),
//!     Arc::new(FileResolver::new()),
//!     Arc::new(JinjaRenderer::new()),
//!     Arc::new(AssumeYes),
//!     Arc::new(OutputFormatter::new(true, 0)),
//!     Settings::default().connect_options(),
//! );
//! let exit_code = workflow.run(&request).await;
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod diff;
pub mod error;
pub mod junos;
pub mod template;
pub mod transaction;
pub mod xml;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::{LoadRequest, Workflow};
    pub use crate::cli::output::OutputFormatter;
    pub use crate::config::Settings;
    pub use crate::connection::ssh::SshConnector;
    pub use crate::connection::{ConnectError, ConnectOptions, Connector, Session};
    pub use crate::credentials::{CredentialResolver, FileResolver};
    pub use crate::error::{Error, Result};
    pub use crate::template::{JinjaRenderer, TemplateRenderer};
    pub use crate::transaction::{
        AssumeYes, CommitMode, Confirmation, LoadMode, Reporter, TransactionReport,
    };
}

/// Returns the current version of cfgload.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
