//! Server-rendered HTML views backed by Tera templates.

use axum::response::Html;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::AppError;

/// Immutable template set, parsed once at startup.
///
/// Templates are addressed by their file name relative to the glob root,
/// e.g. `book-table.html` for `views/book-table.html`.
#[derive(Debug)]
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Parse every template matched by `glob`.
    pub fn load(glob: &str) -> anyhow::Result<Self> {
        let tera = Tera::new(glob)
            .map_err(|e| anyhow::anyhow!("failed to parse templates from '{glob}': {e}"))?;

        if tera.get_template_names().next().is_none() {
            anyhow::bail!("no templates matched '{glob}'");
        }

        tracing::info!(
            templates = ?tera.get_template_names().collect::<Vec<_>>(),
            "views loaded"
        );
        Ok(Self { tera })
    }

    /// Build a template set from in-memory sources.
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(|e| anyhow::anyhow!("failed to parse templates: {e}"))?;
        Ok(Self { tera })
    }

    /// Render `name` with no data.
    pub fn render_empty(&self, name: &str) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(name, &Context::new())?))
    }

    /// Render `name` with `value` bound to `key`.
    pub fn render<T>(&self, name: &str, key: &str, value: &T) -> Result<Html<String>, AppError>
    where
        T: Serialize + ?Sized,
    {
        let mut context = Context::new();
        context.insert(key, value);
        Ok(Html(self.tera.render(name, &context)?))
    }
}
