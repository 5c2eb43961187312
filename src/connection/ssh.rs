//! NETCONF over SSH using russh.
//!
//! Establishment order: TCP connect, SSH handshake with host key policy,
//! password or key authentication, `netconf` subsystem channel, NETCONF
//! hello. A configured jump host is authenticated first and the device
//! session rides a `direct-tcpip` channel through it.

use async_trait::async_trait;
use russh::client::{Handle, Handler};
use russh::keys::key::PublicKey;
use secrecy::ExposeSecret;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::jump_host::JumpHostConfig;
use super::netconf::NetconfStream;
use super::{ConnectError, ConnectOptions, Connector, SessionFacts, Transport, TransportResult};
use crate::config::HostKeyChecking;
use crate::credentials::{ConnectionParams, Secret};

/// SSH subsystem carrying NETCONF
pub const NETCONF_SUBSYSTEM: &str = "netconf";

/// Wraps `russh::Error` for the client `Handler` contract.
#[derive(Debug)]
pub struct RusshError(pub russh::Error);

impl From<russh::Error> for RusshError {
    fn from(err: russh::Error) -> Self {
        RusshError(err)
    }
}

impl std::fmt::Display for RusshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Russh error: {}", self.0)
    }
}

impl std::error::Error for RusshError {}

/// Client handler enforcing the host key policy.
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyChecking,
    known_hosts: PathBuf,
}

impl ClientHandler {
    fn new(host: &str, port: u16, options: &ConnectOptions) -> Self {
        Self {
            host: host.to_string(),
            port,
            policy: options.host_key_checking,
            known_hosts: options.known_hosts_file.clone(),
        }
    }

    fn learn(&self, key: &PublicKey) {
        match russh_keys::learn_known_hosts_path(&self.host, self.port, key, &self.known_hosts) {
            Ok(()) => info!(
                host = %self.host,
                file = %self.known_hosts.display(),
                "Added host key to known_hosts"
            ),
            Err(e) => warn!(host = %self.host, error = %e, "Failed to record host key"),
        }
    }
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = RusshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        if self.policy == HostKeyChecking::Off {
            debug!(host = %self.host, "Host key checking disabled");
            return Ok(true);
        }

        let known = if self.known_hosts.exists() {
            russh_keys::check_known_hosts_path(
                &self.host,
                self.port,
                server_public_key,
                &self.known_hosts,
            )
        } else {
            Ok(false)
        };

        match known {
            Ok(true) => {
                debug!(host = %self.host, "Host key verified against known_hosts");
                Ok(true)
            }
            Ok(false) if self.policy == HostKeyChecking::AcceptNew => {
                warn!(
                    host = %self.host,
                    "Host not found in known_hosts, accepting (first connection)"
                );
                self.learn(server_public_key);
                Ok(true)
            }
            Ok(false) => {
                warn!(host = %self.host, "Host not found in known_hosts, rejecting");
                Ok(false)
            }
            Err(e) => {
                warn!(
                    host = %self.host,
                    error = %e,
                    "HOST KEY VERIFICATION FAILED! Server key does not match known_hosts entry."
                );
                Ok(false)
            }
        }
    }
}

/// Production [`Connector`]: NETCONF over SSH via russh.
#[derive(Debug, Clone, Default)]
pub struct SshConnector;

impl SshConnector {
    /// Create a new SSH connector.
    pub fn new() -> Self {
        Self
    }

    async fn establish(
        params: &ConnectionParams,
        options: &ConnectOptions,
    ) -> Result<Box<dyn Transport>, ConnectError> {
        let port = params.port.unwrap_or(options.port);
        let config = Arc::new(russh::client::Config {
            // A pending operator prompt must not tear the session down
            inactivity_timeout: None,
            ..Default::default()
        });

        let Some(proxy) = params.proxy.as_deref() else {
            let socket = tcp_connect(&params.address, port, options).await?;
            let handler = ClientHandler::new(&params.address, port, options);
            let mut handle = russh::client::connect_stream(config, socket, handler)
                .await
                .map_err(|e| handshake_failed(&params.address, e))?;
            authenticate(&mut handle, &params.username, &params.secret, &params.address).await?;
            let netconf = open_netconf(&handle, &params.address).await?;
            return Ok(Box::new(SshTransport {
                netconf,
                handle,
                jump: None,
            }));
        };

        let jump = JumpHostConfig::parse(proxy)
            .map_err(|e| ConnectError::generic(&params.address, e))?;
        info!(jump = %jump, target = %params.address, "Connecting through jump host");

        let socket = tcp_connect(&jump.host, jump.port, options).await?;
        let handler = ClientHandler::new(&jump.host, jump.port, options);
        let mut jump_handle = russh::client::connect_stream(config.clone(), socket, handler)
            .await
            .map_err(|e| handshake_failed(&jump.host, e))?;
        authenticate(
            &mut jump_handle,
            jump.effective_user(&params.username),
            &params.secret,
            &jump.host,
        )
        .await?;

        let tunnel = jump_handle
            .channel_open_direct_tcpip(params.address.as_str(), u32::from(port), "127.0.0.1", 0)
            .await
            .map_err(|e| {
                ConnectError::generic(
                    &params.address,
                    format!("Failed to open tunnel through {}: {}", jump, e),
                )
            })?;

        let handler = ClientHandler::new(&params.address, port, options);
        let mut handle = russh::client::connect_stream(config, tunnel.into_stream(), handler)
            .await
            .map_err(|e| handshake_failed(&params.address, e))?;
        authenticate(&mut handle, &params.username, &params.secret, &params.address).await?;
        let netconf = open_netconf(&handle, &params.address).await?;

        Ok(Box::new(SshTransport {
            netconf,
            handle,
            jump: Some(jump_handle),
        }))
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(
        &self,
        params: &ConnectionParams,
        options: &ConnectOptions,
    ) -> Result<Box<dyn Transport>, ConnectError> {
        match tokio::time::timeout(options.timeout, Self::establish(params, options)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::Timeout {
                host: params.address.clone(),
                timeout_secs: options.timeout.as_secs(),
            }),
        }
    }
}

async fn tcp_connect(
    host: &str,
    port: u16,
    options: &ConnectOptions,
) -> Result<tokio::net::TcpStream, ConnectError> {
    let socket = tokio::net::TcpStream::connect((host, port))
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::ConnectionRefused => ConnectError::ConnectionRefused {
                host: host.to_string(),
            },
            ErrorKind::TimedOut => ConnectError::Timeout {
                host: host.to_string(),
                timeout_secs: options.timeout.as_secs(),
            },
            _ => ConnectError::generic(host, format!("Failed to connect to {}:{}: {}", host, port, e)),
        })?;

    // Enable TCP_NODELAY for lower latency
    if let Err(e) = socket.set_nodelay(true) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }
    Ok(socket)
}

fn handshake_failed(host: &str, e: RusshError) -> ConnectError {
    ConnectError::generic(host, format!("SSH handshake failed: {}", e))
}

async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    user: &str,
    secret: &Secret,
    host: &str,
) -> Result<(), ConnectError> {
    let auth_failed = |message: String| ConnectError::AuthFailed {
        user: user.to_string(),
        host: host.to_string(),
        message,
    };

    let authenticated = match secret {
        Secret::Password(password) => handle
            .authenticate_password(user, password.expose_secret())
            .await
            .map_err(|e| ConnectError::generic(host, format!("Password authentication error: {}", e)))?,
        Secret::Key { path, passphrase } => {
            let key_pair = russh_keys::load_secret_key(
                path,
                passphrase.as_ref().map(|p| p.expose_secret()),
            )
            .map_err(|e| auth_failed(format!("Failed to load key {}: {}", path.display(), e)))?;
            handle
                .authenticate_publickey(user, Arc::new(key_pair))
                .await
                .map_err(|e| ConnectError::generic(host, format!("Key authentication error: {}", e)))?
        }
    };

    if authenticated {
        debug!(host = %host, user = %user, "Authenticated");
        Ok(())
    } else {
        Err(auth_failed("credentials rejected by server".to_string()))
    }
}

async fn open_netconf(
    handle: &Handle<ClientHandler>,
    host: &str,
) -> Result<NetconfStream<russh::ChannelStream<russh::client::Msg>>, ConnectError> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| ConnectError::generic(host, format!("Failed to open channel: {}", e)))?;

    channel
        .request_subsystem(true, NETCONF_SUBSYSTEM)
        .await
        .map_err(|e| {
            ConnectError::generic(host, format!("Failed to request NETCONF subsystem: {}", e))
        })?;

    NetconfStream::handshake(channel.into_stream())
        .await
        .map_err(|e| ConnectError::generic(host, format!("NETCONF hello failed: {}", e)))
}

/// Live NETCONF session over SSH, optionally tunneled through a jump host.
struct SshTransport<S> {
    netconf: NetconfStream<S>,
    handle: Handle<ClientHandler>,
    jump: Option<Handle<ClientHandler>>,
}

#[async_trait]
impl<S> Transport for SshTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn rpc(&mut self, request: &str) -> TransportResult<String> {
        self.netconf.rpc(request).await
    }

    fn facts(&self) -> &SessionFacts {
        self.netconf.facts()
    }

    async fn close(&mut self) -> TransportResult<()> {
        let farewell = self.netconf.close().await;

        if let Err(e) = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "Session closed by client", "en")
            .await
        {
            debug!(error = %e, "SSH disconnect failed");
        }
        if let Some(jump) = self.jump.take() {
            if let Err(e) = jump
                .disconnect(russh::Disconnect::ByApplication, "Tunnel closed by client", "en")
                .await
            {
                debug!(error = %e, "Jump host disconnect failed");
            }
        }
        farewell
    }
}
