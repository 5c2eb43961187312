//! NETCONF 1.0 message framing (RFC 6242 end-of-message delimiter).
//!
//! [`NetconfStream`] wraps any byte stream (an SSH `netconf` subsystem
//! channel in production, an in-memory duplex in tests), performs the hello
//! exchange and then frames each RPC and reply.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::{SessionFacts, Transport, TransportError, TransportResult};
use crate::xml;

/// NETCONF 1.0 message delimiter
pub const EOM_DELIMITER: &str = "]]>]]>";

/// NETCONF base namespace (RFC 6241)
pub const NETCONF_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

const READ_CHUNK: usize = 8 * 1024;

/// Capabilities announced in the client hello.
const CLIENT_CAPABILITIES: &[&str] = &[
    "urn:ietf:params:netconf:base:1.0",
    "urn:ietf:params:netconf:capability:candidate:1.0",
    "urn:ietf:params:netconf:capability:confirmed-commit:1.0",
    "urn:ietf:params:netconf:capability:validate:1.0",
    "urn:ietf:params:netconf:capability:url:1.0?scheme=http,ftp,file",
];

/// NETCONF conversation over an arbitrary byte stream.
pub struct NetconfStream<S> {
    stream: S,
    buffer: Vec<u8>,
    next_message_id: u64,
    facts: SessionFacts,
    closed: bool,
}

impl<S> NetconfStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Read the server hello, answer with the client hello.
    pub async fn handshake(stream: S) -> TransportResult<Self> {
        let mut conversation = Self {
            stream,
            buffer: Vec::new(),
            next_message_id: 1,
            facts: SessionFacts::default(),
            closed: false,
        };

        let hello = conversation.read_message().await?;
        conversation.facts = parse_server_hello(&hello)?;
        conversation.write_message(&client_hello()).await?;

        debug!(
            session_id = ?conversation.facts.session_id,
            capabilities = conversation.facts.capabilities.len(),
            "NETCONF hello exchanged"
        );
        Ok(conversation)
    }

    async fn write_message(&mut self, message: &str) -> TransportResult<()> {
        trace!(bytes = message.len(), "sending NETCONF message");
        self.stream.write_all(message.as_bytes()).await?;
        self.stream.write_all(EOM_DELIMITER.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_message(&mut self) -> TransportResult<String> {
        let delimiter = EOM_DELIMITER.as_bytes();
        loop {
            if let Some(pos) = find_subsequence(&self.buffer, delimiter) {
                let frame: Vec<u8> = self.buffer.drain(..pos + delimiter.len()).collect();
                let body = &frame[..pos];
                trace!(bytes = body.len(), "received NETCONF message");
                return String::from_utf8(body.to_vec())
                    .map_err(|e| TransportError::Malformed(format!("invalid UTF-8: {}", e)));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let read = self.stream.read(&mut chunk).await?;
            if read == 0 {
                return Err(TransportError::Closed);
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

#[async_trait]
impl<S> Transport for NetconfStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn rpc(&mut self, request: &str) -> TransportResult<String> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let message_id = self.next_message_id;
        self.next_message_id += 1;

        let rpc = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rpc xmlns="{}" message-id="{}">{}</rpc>"#,
            NETCONF_NS, message_id, request
        );
        self.write_message(&rpc).await?;
        self.read_message().await
    }

    fn facts(&self) -> &SessionFacts {
        &self.facts
    }

    async fn close(&mut self) -> TransportResult<()> {
        if self.closed {
            return Ok(());
        }
        let farewell = self.rpc("<close-session/>").await;
        self.closed = true;
        self.stream.shutdown().await?;
        farewell.map(drop)
    }
}

/// Build the client hello message (without delimiter).
fn client_hello() -> String {
    let capabilities: String = CLIENT_CAPABILITIES
        .iter()
        .map(|c| format!("<capability>{}</capability>", xml::escape(c)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><hello xmlns="{}"><capabilities>{}</capabilities></hello>"#,
        NETCONF_NS, capabilities
    )
}

/// Parse the server hello into session facts.
fn parse_server_hello(message: &str) -> TransportResult<SessionFacts> {
    if xml::root_name(message) != Some("hello") {
        return Err(TransportError::Malformed(
            "expected <hello> from device".to_string(),
        ));
    }

    Ok(SessionFacts {
        session_id: xml::element_text(message, "session-id").and_then(|id| id.parse().ok()),
        capabilities: xml::elements(message, "capability")
            .into_iter()
            .map(|c| xml::unescape(c.trim()))
            .collect(),
    })
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
