//! Parsing of Junos `<rpc-reply>` documents.

use std::fmt;

use crate::connection::TransportError;
use crate::transaction::{DatabaseError, DatabaseResult};
use crate::xml;

/// Severity of an `rpc-error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails the operation
    Error,
    /// Informational unless warnings are refused
    Warning,
}

impl Severity {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("warning") => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// NETCONF RPC error
#[derive(Debug, Clone, PartialEq)]
pub struct NetconfError {
    /// Error type (protocol, application, etc.)
    pub error_type: String,
    /// Error tag (e.g., invalid-value, operation-failed)
    pub tag: String,
    /// Error severity
    pub severity: Severity,
    /// Error message
    pub message: Option<String>,
    /// Error path (configuration element that caused the error)
    pub path: Option<String>,
    /// Offending statement, from `<error-info><bad-element>`
    pub bad_element: Option<String>,
}

impl NetconfError {
    /// Parse a single rpc-error element
    fn parse(fragment: &str) -> Self {
        NetconfError {
            error_type: xml::element_text(fragment, "error-type").unwrap_or_default(),
            tag: xml::element_text(fragment, "error-tag").unwrap_or_default(),
            severity: Severity::parse(xml::element_text(fragment, "error-severity").as_deref()),
            message: xml::element_text(fragment, "error-message").filter(|m| !m.is_empty()),
            path: xml::element_text(fragment, "error-path").filter(|p| !p.is_empty()),
            bad_element: xml::element_text(fragment, "bad-element").filter(|b| !b.is_empty()),
        }
    }

    /// Whether this is a warning rather than an error.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for NetconfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tag.is_empty() {
            write!(f, "[{}] ", self.tag)?;
        }
        write!(f, "{}", self.message.as_deref().unwrap_or("Unknown error"))?;
        if let Some(bad) = &self.bad_element {
            write!(f, " ({})", bad)?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {}", path)?;
        }
        Ok(())
    }
}

/// Parsed `<rpc-reply>`.
#[derive(Debug, Clone)]
pub struct NetconfReply {
    /// Every `rpc-error`, warnings included
    pub errors: Vec<NetconfError>,
    /// Whether the reply carried `<ok/>`
    pub ok: bool,
    body: String,
}

impl NetconfReply {
    /// Parse a reply document.
    pub fn parse(document: &str) -> Result<Self, TransportError> {
        if xml::root_name(document) != Some("rpc-reply") {
            return Err(TransportError::Malformed(format!(
                "expected <rpc-reply>, got {}",
                xml::root_name(document).unwrap_or("nothing")
            )));
        }

        Ok(NetconfReply {
            errors: xml::elements(document, "rpc-error")
                .into_iter()
                .map(NetconfError::parse)
                .collect(),
            ok: xml::has_element(document, "ok"),
            body: document.to_string(),
        })
    }

    /// Messages of warning-severity errors.
    pub fn warnings(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.is_warning())
            .map(ToString::to_string)
            .collect()
    }

    /// Fail on errors; warnings fail too unless `ignore_warnings` is set.
    pub fn check(self, ignore_warnings: bool) -> DatabaseResult<Self> {
        let fatal = self
            .errors
            .iter()
            .any(|e| !e.is_warning() || !ignore_warnings);
        if fatal {
            return Err(DatabaseError::Rejected(self.errors));
        }
        Ok(self)
    }

    /// Unescaped text of the first `<tag>` element in the reply.
    pub fn text_of(&self, tag: &str) -> Option<String> {
        xml::element_text(&self.body, tag)
    }
}
