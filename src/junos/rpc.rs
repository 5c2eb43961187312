//! Junos XML RPC request bodies (the content of `<rpc>`).

use crate::transaction::{Candidate, CommitMode, ConfigFormat, DatabaseError, LoadMode};
use crate::xml;

/// `<lock-configuration/>`
pub fn lock() -> &'static str {
    "<lock-configuration/>"
}

/// `<unlock-configuration/>`
pub fn unlock() -> &'static str {
    "<unlock-configuration/>"
}

/// `<open-configuration>` for a private scope.
///
/// Shared and exclusive both work on the global candidate; exclusive is
/// a lock held for the whole run, not a separate database.
pub fn open_configuration(mode: CommitMode) -> Option<&'static str> {
    match mode {
        CommitMode::Private => Some("<open-configuration><private/></open-configuration>"),
        CommitMode::Shared | CommitMode::Exclusive => None,
    }
}

/// `<close-configuration/>`
pub fn close_configuration() -> &'static str {
    "<close-configuration/>"
}

/// Candidate vs. rollback 0 (the active configuration), as text.
pub fn get_diff() -> &'static str {
    r#"<get-configuration compare="rollback" rollback="0" format="text"/>"#
}

/// `<commit-configuration>`, with the comment as `<log>`.
pub fn commit(comment: Option<&str>) -> String {
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(comment) => format!(
            "<commit-configuration><log>{}</log></commit-configuration>",
            xml::escape(comment)
        ),
        None => "<commit-configuration/>".to_string(),
    }
}

/// `<load-configuration>` for a candidate under a load mode.
///
/// Set-format candidates always use `action="set"`; override and update
/// have no set-format equivalent.
pub fn load_configuration(candidate: &Candidate, mode: LoadMode) -> Result<String, DatabaseError> {
    let format = candidate.format.rpc_format();
    let rpc = match candidate.format {
        ConfigFormat::Set => {
            if matches!(mode, LoadMode::Override | LoadMode::Update) {
                return Err(DatabaseError::Unsupported(format!(
                    "load mode '{}' is not supported for set-format configuration {}",
                    mode,
                    candidate.origin.display()
                )));
            }
            format!(
                r#"<load-configuration action="set" format="{}"><configuration-set>{}</configuration-set></load-configuration>"#,
                format,
                xml::escape(&candidate.text)
            )
        }
        ConfigFormat::Text => format!(
            r#"<load-configuration action="{}" format="{}"><configuration-text>{}</configuration-text></load-configuration>"#,
            mode.action(),
            format,
            xml::escape(&candidate.text)
        ),
        ConfigFormat::Json => format!(
            r#"<load-configuration action="{}" format="{}"><configuration-json>{}</configuration-json></load-configuration>"#,
            mode.action(),
            format,
            xml::escape(&candidate.text)
        ),
        ConfigFormat::Xml => format!(
            r#"<load-configuration action="{}" format="{}">{}</load-configuration>"#,
            mode.action(),
            format,
            strip_xml_declaration(&candidate.text)
        ),
    };
    Ok(rpc)
}

/// XML candidates are embedded verbatim, minus any `<?xml ...?>` prolog.
fn strip_xml_declaration(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map_or(trimmed, |end| rest[end + 2..].trim_start()),
        None => trimmed,
    }
}
