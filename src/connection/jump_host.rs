//! Jump host (bastion) specifications.
//!
//! A device behind a bastion is reached by tunneling the device's SSH
//! session through a `direct-tcpip` channel of an authenticated session to
//! the jump host. The specification is the familiar `[user@]host[:port]`
//! form, with bracketed IPv6 literals.

use std::fmt;

use super::DEFAULT_PORT;

/// A single jump host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpHostConfig {
    /// Hostname or IP address of the jump host
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Username for the jump host, if different from the device's
    pub user: Option<String>,
}

impl JumpHostConfig {
    /// Create a jump host on the default port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: None,
        }
    }

    /// Set the SSH port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Parse a jump host specification.
    ///
    /// Supports formats:
    /// - `host`
    /// - `host:port`
    /// - `user@host`
    /// - `user@host:port`
    /// - `[::1]:port` and bare IPv6 literals
    pub fn parse(spec: &str) -> Result<Self, String> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err("empty jump host specification".to_string());
        }

        let (user, host_port) = match spec.rsplit_once('@') {
            Some((user, rest)) if !user.is_empty() => (Some(user.to_string()), rest),
            Some(_) => return Err(format!("empty user in jump host '{}'", spec)),
            None => (None, spec),
        };

        let invalid_port = || format!("invalid port in jump host '{}'", spec);

        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let Some((host, after)) = bracketed.split_once(']') else {
                return Err(format!("invalid IPv6 address in jump host '{}'", spec));
            };
            let port = match after.strip_prefix(':') {
                Some(port) => port.parse().map_err(|_| invalid_port())?,
                None if after.is_empty() => DEFAULT_PORT,
                None => return Err(invalid_port()),
            };
            (host.to_string(), port)
        } else if host_port.matches(':').count() > 1 {
            // Unbracketed IPv6 carries no port
            (host_port.to_string(), DEFAULT_PORT)
        } else if let Some((host, port)) = host_port.split_once(':') {
            (host.to_string(), port.parse().map_err(|_| invalid_port())?)
        } else {
            (host_port.to_string(), DEFAULT_PORT)
        };

        if host.is_empty() {
            return Err(format!("missing host in jump host '{}'", spec));
        }

        Ok(Self { host, port, user })
    }

    /// Get the effective user, falling back to the device's.
    pub fn effective_user<'a>(&'a self, default_user: &'a str) -> &'a str {
        self.user.as_deref().unwrap_or(default_user)
    }
}

impl fmt::Display for JumpHostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if self.port != DEFAULT_PORT {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}
