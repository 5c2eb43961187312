//! Minimal XML helpers for NETCONF payloads.
//!
//! Junos replies are small, flat documents; these helpers extract element
//! text by tag name without building a tree.

/// Escape text for embedding in an XML element or attribute.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Reverse [`escape`], including numeric character references.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };

        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Find the byte range of the next opening tag `<tag ...>` at or after `from`.
///
/// Returns `(tag_start, content_start, self_closing)`.
fn find_open_tag(doc: &str, tag: &str, from: usize) -> Option<(usize, usize, bool)> {
    let needle = format!("<{}", tag);
    let mut search = from;

    while let Some(rel) = doc[search..].find(&needle) {
        let start = search + rel;
        let after = start + needle.len();
        match doc[after..].chars().next() {
            Some('>') => return Some((start, after + 1, false)),
            Some(c) if c == '/' || c.is_whitespace() => {
                let close = doc[after..].find('>')? + after;
                let self_closing = doc[..close].ends_with('/');
                return Some((start, close + 1, self_closing));
            }
            _ => search = after,
        }
    }

    None
}

/// Raw (still escaped) inner content of every `<tag>` element, in order.
///
/// Self-closing elements yield an empty string.
pub fn elements<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
    let end_tag = format!("</{}>", tag);
    let mut found = Vec::new();
    let mut search = 0;

    while let Some((_, content_start, self_closing)) = find_open_tag(doc, tag, search) {
        if self_closing {
            found.push("");
            search = content_start;
            continue;
        }
        let Some(rel_end) = doc[content_start..].find(&end_tag) else {
            break;
        };
        let content_end = content_start + rel_end;
        found.push(&doc[content_start..content_end]);
        search = content_end + end_tag.len();
    }

    found
}

/// Unescaped, trimmed text of the first `<tag>` element.
pub fn element_text(doc: &str, tag: &str) -> Option<String> {
    elements(doc, tag)
        .first()
        .map(|raw| unescape(raw.trim()))
}

/// Whether the document contains a `<tag>` element (open or self-closing).
pub fn has_element(doc: &str, tag: &str) -> bool {
    find_open_tag(doc, tag, 0).is_some()
}

/// Name of the first element in a document, skipping the XML declaration.
pub fn root_name(doc: &str) -> Option<&str> {
    let mut rest = doc.trim_start();
    while let Some(stripped) = rest.strip_prefix("<?") {
        rest = stripped[stripped.find("?>")? + 2..].trim_start();
    }
    let body = rest.strip_prefix('<')?;
    let end = body
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(body.len());
    Some(&body[..end])
}
