//! Credential resolution.
//!
//! A credentials file (TOML) turns a host identifier into
//! [`ConnectionParams`]. Two layouts are supported:
//!
//! - **flat**: a single `[credentials]` table; the host argument is the
//!   address to connect to.
//! - **inventory**: an `[inventory]` table pointing at a CSV device table
//!   (`hostname,address,proxy,auth`) whose rows reference `[auth.<id>]` and
//!   `[proxy.<id>]` tables of the same file.
//!
//! ```toml
//! [inventory]
//! path = "devices.csv"
//!
//! [auth.core]
//! username = "netops"
//! key_file = "~/.ssh/id_ed25519"
//!
//! [proxy.dc1]
//! jump = "ops@bastion.example.net:22"
//! ```

mod flat;
mod inventory;

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while resolving a host's connection parameters.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A credentials or inventory file could not be read.
    #[error("Unable to read '{path}': {source}")]
    FileUnreadable {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file was read but its contents are not usable.
    #[error("Malformed credentials file '{path}': {message}")]
    Malformed {
        /// File that failed
        path: PathBuf,
        /// What was wrong
        message: String,
    },

    /// The host is not listed in the device inventory.
    #[error("Host '{host}' not found in '{path}'")]
    HostNotFound {
        /// Requested host
        host: String,
        /// Inventory that was searched
        path: PathBuf,
    },

    /// A referenced section is absent from the credentials file.
    #[error("Section [{section}] not found in '{path}'")]
    SectionMissing {
        /// Section name, e.g. `auth.core`
        section: String,
        /// Credentials file
        path: PathBuf,
    },
}

impl ResolveError {
    fn malformed(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    fn section_missing(path: &Path, section: impl Into<String>) -> Self {
        Self::SectionMissing {
            section: section.into(),
            path: path.to_path_buf(),
        }
    }
}

/// Secret material presented to the device.
#[derive(Debug, Clone)]
pub enum Secret {
    /// Password authentication
    Password(SecretString),
    /// Public key authentication
    Key {
        /// Private key file
        path: PathBuf,
        /// Passphrase protecting the key
        passphrase: Option<SecretString>,
    },
}

/// Everything needed to open a session to one device.
///
/// Immutable once resolved; consumed by [`crate::connection::Session`].
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Address (hostname or IP) to connect to
    pub address: String,
    /// Port override; settings decide when absent
    pub port: Option<u16>,
    /// Login name
    pub username: String,
    /// Password or key
    pub secret: Secret,
    /// Jump host specification, `[user@]host[:port]`
    pub proxy: Option<String>,
}

/// Resolves a host identifier against a credentials source.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialResolver: Send + Sync {
    /// Look up connection parameters for `host`.
    fn resolve(&self, cfgfile: &Path, host: &str) -> Result<ConnectionParams, ResolveError>;
}

/// Resolver backed by a TOML credentials file, flat or inventory-backed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl FileResolver {
    /// Create a new file resolver.
    pub fn new() -> Self {
        Self
    }
}

impl CredentialResolver for FileResolver {
    fn resolve(&self, cfgfile: &Path, host: &str) -> Result<ConnectionParams, ResolveError> {
        let content =
            std::fs::read_to_string(cfgfile).map_err(|source| ResolveError::FileUnreadable {
                path: cfgfile.to_path_buf(),
                source,
            })?;
        let file: CredentialsFile =
            toml::from_str(&content).map_err(|e| ResolveError::malformed(cfgfile, e))?;

        let base_dir = cfgfile.parent().unwrap_or_else(|| Path::new("."));
        let params = match (&file.inventory, &file.credentials) {
            (Some(inventory), _) => {
                debug!(cfgfile = %cfgfile.display(), "resolving through device inventory");
                inventory::resolve(&file, inventory, cfgfile, base_dir, host)?
            }
            (None, Some(credentials)) => {
                debug!(cfgfile = %cfgfile.display(), "resolving from flat credentials");
                flat::resolve(credentials, cfgfile, base_dir, host)?
            }
            (None, None) => return Err(ResolveError::section_missing(cfgfile, "credentials")),
        };

        debug!(
            host = %host,
            address = %params.address,
            user = %params.username,
            proxy = ?params.proxy,
            "credentials resolved"
        );
        Ok(params)
    }
}

// ============================================================================
// File layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    credentials: Option<FlatCredentials>,
    inventory: Option<InventorySection>,
    #[serde(default)]
    auth: HashMap<String, AuthProfile>,
    #[serde(default)]
    proxy: HashMap<String, ProxyProfile>,
}

#[derive(Debug, Deserialize)]
struct FlatCredentials {
    #[serde(flatten)]
    auth: AuthProfile,
    proxy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InventorySection {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AuthProfile {
    username: String,
    password: Option<String>,
    key_file: Option<String>,
    passphrase: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ProxyProfile {
    jump: String,
}

impl AuthProfile {
    /// A key file wins over a password when both are present.
    fn secret(&self, cfgfile: &Path, base_dir: &Path) -> Result<Secret, ResolveError> {
        if let Some(key_file) = &self.key_file {
            return Ok(Secret::Key {
                path: resolve_path(base_dir, key_file),
                passphrase: self.passphrase.clone().map(SecretString::from),
            });
        }
        match &self.password {
            Some(password) => Ok(Secret::Password(SecretString::from(password.clone()))),
            None => Err(ResolveError::malformed(
                cfgfile,
                format!("no password or key_file for user '{}'", self.username),
            )),
        }
    }
}

/// Expand `~` and anchor relative paths at the credentials file's directory.
fn resolve_path(base_dir: &Path, raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}
