use minijinja::Environment;
use serde_json::Value;
use thiserror::Error;

use super::message::EmailTemplate;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

/// Renders plain-text and HTML bodies for an [`EmailTemplate`].
///
/// Templates are compiled into the binary, so a missing template is a
/// programming error surfaced at startup rather than at send time.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

fn text_name(template: EmailTemplate) -> &'static str {
    match template {
        EmailTemplate::Confirm => "confirm.txt",
        EmailTemplate::ResetPassword => "reset_password.txt",
        EmailTemplate::ChangeEmail => "change_email.txt",
    }
}

fn html_name(template: EmailTemplate) -> &'static str {
    match template {
        EmailTemplate::Confirm => "confirm.html",
        EmailTemplate::ResetPassword => "reset_password.html",
        EmailTemplate::ChangeEmail => "change_email.html",
    }
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut env = Environment::new();

        for template in EmailTemplate::ALL {
            let (text, html) = template.sources();
            env.add_template(text_name(template), text)
                .map_err(|e| TemplateError::RenderError(e.to_string()))?;
            env.add_template(html_name(template), html)
                .map_err(|e| TemplateError::RenderError(e.to_string()))?;
            tracing::debug!("Loaded email template: {}", template.name());
        }

        Ok(Self { env })
    }

    /// Render `(text, html)` bodies
    pub fn render(
        &self,
        template: EmailTemplate,
        context: &Value,
    ) -> Result<(String, String), TemplateError> {
        let text = self.render_one(text_name(template), context)?;
        let html = self.render_one(html_name(template), context)?;
        Ok((text, html))
    }

    fn render_one(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|_| TemplateError::NotFound(name.to_string()))?;

        tmpl.render(context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_bodies_escape_variables() {
        let renderer = TemplateRenderer::new().unwrap();
        let context = json!({
            "name": "<script>",
            "organization": "Ripoti Taka",
            "link": "http://localhost/x",
            "expires_in_minutes": 60,
        });

        let (text, html) = renderer.render(EmailTemplate::Confirm, &context).unwrap();
        assert!(text.contains("<script>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_all_templates_render() {
        let renderer = TemplateRenderer::new().unwrap();
        let context = json!({
            "name": "alice",
            "organization": "Ripoti Taka",
            "link": "http://localhost/api/auth/user/confirm/abc",
            "expires_in_minutes": 60,
        });

        for template in EmailTemplate::ALL {
            let (text, html) = renderer.render(template, &context).unwrap();
            assert!(text.contains("alice"));
            assert!(text.contains("http://localhost/api/auth/user/confirm/abc"));
            assert!(html.contains("<a href="));
            assert!(html.contains("60 minutes"));
        }
    }
}
