//! Configuration templates.
//!
//! Templates are Jinja2-compatible and rendered with minijinja. The variable
//! file's JSON object is the template context; `{% include %}` resolves
//! relative to the template's directory.

use minijinja::Environment;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("Unable to read template '{path}': {source}")]
    Read {
        /// Template file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The template failed to parse or render.
    #[error("Failed to render template '{path}': {message}")]
    Render {
        /// Template file
        path: PathBuf,
        /// Engine error, with location
        message: String,
    },
}

/// Produces configuration text from a template and variables.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render `path` with `vars` as the context.
    fn render(&self, path: &Path, vars: &serde_json::Value) -> Result<String, TemplateError>;
}

/// minijinja-backed renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaRenderer;

impl JinjaRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, path: &Path, vars: &serde_json::Value) -> Result<String, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let render_error = |e: minijinja::Error| TemplateError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            env.set_loader(minijinja::path_loader(dir));
        } else {
            env.set_loader(minijinja::path_loader("."));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        env.add_template_owned(name.clone(), source)
            .map_err(render_error)?;

        let rendered = env
            .get_template(&name)
            .and_then(|template| template.render(vars))
            .map_err(render_error)?;

        debug!(template = %path.display(), bytes = rendered.len(), "template rendered");
        Ok(rendered)
    }
}
