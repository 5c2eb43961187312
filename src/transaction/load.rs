//! What to load and how: load modes, database scopes, candidate sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How candidate text is combined with the existing candidate configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Replace the corresponding subtrees, honoring `replace:` markers
    #[default]
    Replace,
    /// Merge into the existing candidate, no deletions implied
    Merge,
    /// Overwrite the entire configuration
    Override,
    /// Merge, computing the diff against the active configuration
    Update,
}

impl LoadMode {
    /// All modes, in CLI order.
    pub const ALL: [LoadMode; 4] = [
        LoadMode::Replace,
        LoadMode::Merge,
        LoadMode::Override,
        LoadMode::Update,
    ];

    /// Name as used on the command line and in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Replace => "replace",
            LoadMode::Merge => "merge",
            LoadMode::Override => "override",
            LoadMode::Update => "update",
        }
    }

    /// `action` attribute of `<load-configuration>`.
    pub fn action(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of the candidate configuration database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// The global candidate shared by all sessions
    #[default]
    Shared,
    /// A private copy, merged at commit time
    Private,
    /// The global candidate, locked against other writers
    Exclusive,
}

impl CommitMode {
    /// Name as used on the command line and in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitMode::Shared => "shared",
            CommitMode::Private => "private",
            CommitMode::Exclusive => "exclusive",
        }
    }

    /// Whether the scope is entered with `<open-configuration>`.
    pub fn opens_database(&self) -> bool {
        matches!(self, CommitMode::Private)
    }

    /// Whether the scope holds the configuration lock, even when locking
    /// was turned off.
    pub fn holds_lock(&self) -> bool {
        matches!(self, CommitMode::Exclusive)
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntax of candidate text, as understood by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Curly-brace configuration text
    #[default]
    Text,
    /// `set`/`delete` commands
    Set,
    /// Junos XML
    Xml,
    /// Junos JSON
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file name.
    ///
    /// A template suffix (`.j2`, `.jinja`, `.jinja2`) is stripped first, so
    /// `edge.set.j2` renders to set commands.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let name = [".j2", ".jinja2", ".jinja"]
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(name.as_str());

        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("set") => ConfigFormat::Set,
            Some("xml") => ConfigFormat::Xml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Text,
        }
    }

    /// `format` attribute of `<load-configuration>`.
    pub fn rpc_format(&self) -> &'static str {
        match self {
            ConfigFormat::Text | ConfigFormat::Set => "text",
            ConfigFormat::Xml => "xml",
            ConfigFormat::Json => "json",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigFormat::Text => "text",
            ConfigFormat::Set => "set",
            ConfigFormat::Xml => "xml",
            ConfigFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// Where the candidate text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// Literal configuration file, loaded as is
    File(PathBuf),
    /// Template rendered with the given variables
    Template {
        /// Template file
        path: PathBuf,
        /// Variables (the parsed var file)
        vars: serde_json::Value,
    },
}

impl LoadSource {
    /// Whether the source is rendered before loading.
    pub fn is_template(&self) -> bool {
        matches!(self, LoadSource::Template { .. })
    }
}

/// Everything about the candidate, fixed before the transaction starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSpec {
    /// Literal file or template + variables
    pub source: LoadSource,
    /// How the candidate merges with the existing candidate
    pub mode: LoadMode,
    /// Accept device warnings on load
    pub ignore_warnings: bool,
}

/// Candidate text ready to be sent to the device.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Configuration text
    pub text: String,
    /// Syntax of `text`
    pub format: ConfigFormat,
    /// File it came from
    pub origin: PathBuf,
}

impl Candidate {
    /// Build a candidate, detecting the format from `origin`.
    pub fn new(text: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        let origin = origin.into();
        Self {
            text: text.into(),
            format: ConfigFormat::from_path(&origin),
            origin,
        }
    }
}
