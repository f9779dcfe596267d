/// Template renderer using Tera for Jinja2-style manifest rendering.
use crate::embedded_templates;
use crate::error::{BootstrapError, Result};
use std::collections::HashMap;
use tera::{Context, Tera};

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a TemplateRenderer from embedded templates (compiled into the
    /// binary). The tool is self-contained: no template files need to be
    /// shipped next to it.
    pub fn from_embedded() -> Result<Self> {
        tracing::debug!("[TemplateRenderer] Initializing Tera from embedded templates");

        let mut tera = Tera::default();
        let mut template_count = 0;

        for (name, content) in embedded_templates::ALL_TEMPLATES {
            if let Err(e) = tera.add_raw_template(name, content) {
                tracing::warn!(
                    "[TemplateRenderer] Failed to add embedded template {}: {}",
                    name,
                    e
                );
            } else {
                template_count += 1;
            }
        }

        tracing::debug!(
            "[TemplateRenderer] Loaded {} embedded templates",
            template_count
        );

        Ok(Self { tera })
    }

    /// Render a template with string variables.
    pub fn render(&self, template_name: &str, vars: &HashMap<String, String>) -> Result<String> {
        let mut context = Context::new();
        for (key, value) in vars {
            context.insert(key, value);
        }
        self.render_with_context(template_name, &context)
    }

    /// Render a template with a Tera Context directly.
    pub fn render_with_context(&self, template_name: &str, context: &Context) -> Result<String> {
        let rendered = self.tera.render(template_name, context).map_err(|e| {
            BootstrapError::Template(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })?;

        tracing::debug!(
            "[TemplateRenderer] Rendered template {} ({} bytes)",
            template_name,
            rendered.len()
        );

        Ok(rendered)
    }

    /// List all loaded template names
    pub fn list_templates(&self) -> Vec<String> {
        self.tera.get_template_names().map(String::from).collect()
    }
}
