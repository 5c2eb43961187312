//! Session lifecycle: one authenticated connection to one device.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    ConnectError, ConnectOptions, Connector, SessionFacts, Transport, TransportError,
    TransportResult,
};
use crate::credentials::ConnectionParams;

/// A management session with a single device.
///
/// Created unopened. [`Session::open`] transitions it to live with a single
/// attempt; [`Session::close`] is idempotent and safe on a session that
/// never opened.
pub struct Session {
    params: ConnectionParams,
    connector: Arc<dyn Connector>,
    options: ConnectOptions,
    transport: Option<Box<dyn Transport>>,
}

impl Session {
    /// Create an unopened session.
    pub fn new(
        params: ConnectionParams,
        connector: Arc<dyn Connector>,
        options: ConnectOptions,
    ) -> Self {
        Self {
            params,
            connector,
            options,
            transport: None,
        }
    }

    /// Whether a transport is currently open.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Authenticate and set up the transport. Exactly one attempt.
    ///
    /// Opening an already-open session returns the existing facts without
    /// reconnecting.
    pub async fn open(&mut self) -> Result<&SessionFacts, ConnectError> {
        if self.transport.is_none() {
            debug!(
                address = %self.params.address,
                user = %self.params.username,
                "opening session"
            );
            let transport = self.connector.connect(&self.params, &self.options).await?;
            info!(
                address = %self.params.address,
                session_id = ?transport.facts().session_id,
                "session established"
            );
            self.transport = Some(transport);
        }

        match &self.transport {
            Some(transport) => Ok(transport.facts()),
            None => Err(ConnectError::generic(
                &self.params.address,
                "transport vanished after open",
            )),
        }
    }

    /// Release transport resources. Never fails; repeated calls are no-ops.
    pub async fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        match transport.close().await {
            Ok(()) => debug!(address = %self.params.address, "session closed"),
            Err(e) => debug!(
                address = %self.params.address,
                error = %e,
                "error while closing session, ignored"
            ),
        }
    }

    /// Send one RPC body over the open transport.
    pub(crate) async fn rpc(&mut self, request: &str) -> TransportResult<String> {
        match self.transport.as_mut() {
            Some(transport) => transport.rpc(request).await,
            None => Err(TransportError::NotOpen),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("params", &self.params)
            .field("options", &self.options)
            .field("open", &self.is_open())
            .finish()
    }
}
