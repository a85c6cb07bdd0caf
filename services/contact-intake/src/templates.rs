//! Email Templates
//!
//! Handlebars-based rendering for the notification and auto-reply emails.

use std::collections::HashMap;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

pub const CONTACT_NOTIFICATION: &str = "contact_notification";
pub const CONTACT_AUTO_REPLY: &str = "contact_auto_reply";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub subject_template: String,
    pub body_html_template: String,
    pub body_text_template: String,
}

/// Template rendering result
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    templates: HashMap<String, EmailTemplate>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            handlebars: Handlebars::new(),
            templates: HashMap::new(),
        };

        engine.register_builtin_templates();

        engine
    }

    fn register_builtin_templates(&mut self) {
        // Business notification. The text body deliberately carries the
        // Name:/Email: tokens the inbound-reply parser looks for when a
        // forwarded copy of this email comes back through the webhook.
        let notification = EmailTemplate {
            id: CONTACT_NOTIFICATION.to_string(),
            subject_template: "New Contact Form Submission from {{name}}".to_string(),
            body_html_template: r#"<h3>New Contact Form Submission</h3>
<p><strong>Name:</strong> {{name}}</p>
<p><strong>Email:</strong> {{email}}</p>
<p><strong>Phone:</strong> {{phone}}</p>
<p><strong>Investment Goal:</strong> {{investment_goal}}</p>
<hr />
<p><strong>Message:</strong></p>
<p>{{{message_html}}}</p>
"#
            .to_string(),
            body_text_template: r#"Name: {{name}}
Email: {{email}}
Phone: {{phone}}
Investment Goal: {{investment_goal}}

Message:
{{message}}
"#
            .to_string(),
        };

        self.templates.insert(notification.id.clone(), notification);

        // Client auto-reply acknowledging receipt.
        let auto_reply = EmailTemplate {
            id: CONTACT_AUTO_REPLY.to_string(),
            subject_template: "Thank you for contacting Juniper Broz Investment Services"
                .to_string(),
            body_html_template: r#"<p>Dear {{name}},</p>
<p>Thank you for reaching out about {{interest}}. Your message has been received and a member of our team will get back to you shortly.</p>
<p>In the meantime, feel free to review your registration details on FINRA BrokerCheck.</p>
<p>Best regards,<br>Juniper Broz Investment Services</p>
"#
            .to_string(),
            body_text_template: r#"Dear {{name}},

Thank you for reaching out about {{interest}}. Your message has been received and a member of our team will get back to you shortly.

Best regards,
Juniper Broz Investment Services
"#
            .to_string(),
        };

        self.templates.insert(auto_reply.id.clone(), auto_reply);
    }

    /// Render template with variables
    pub fn render(
        &self,
        template_id: &str,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<RenderedEmail> {
        let template = self
            .templates
            .get(template_id)
            .context("Template not found")?;

        let subject = self
            .handlebars
            .render_template(&template.subject_template, variables)
            .context("Failed to render subject")?;

        let body_html = self
            .handlebars
            .render_template(&template.body_html_template, variables)
            .context("Failed to render HTML body")?;

        let body_text = self
            .handlebars
            .render_template(&template.body_text_template, variables)
            .context("Failed to render text body")?;

        Ok(RenderedEmail {
            subject,
            body_html,
            body_text,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML-escape free text and turn newlines into `<br>` for paragraph
/// embedding.
pub fn html_paragraph(text: &str) -> String {
    handlebars::html_escape(text).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn notification_vars(message: &str) -> HashMap<String, Value> {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), json!("Jane"));
        vars.insert("email".to_string(), json!("jane@x.com"));
        vars.insert("phone".to_string(), json!("Not provided"));
        vars.insert("investment_goal".to_string(), json!("Not specified"));
        vars.insert("message".to_string(), json!(message));
        vars.insert(
            "message_html".to_string(),
            json!(html_paragraph(message)),
        );
        vars
    }

    #[test]
    fn test_notification_subject_includes_name() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render(CONTACT_NOTIFICATION, &notification_vars("Hi"))
            .unwrap();
        assert_eq!(rendered.subject, "New Contact Form Submission from Jane");
    }

    #[test]
    fn test_notification_text_body_carries_parser_tokens() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render(CONTACT_NOTIFICATION, &notification_vars("Hi"))
            .unwrap();
        assert!(rendered.body_text.contains("Name: Jane"));
        assert!(rendered.body_text.contains("Email: jane@x.com"));
    }

    #[test]
    fn test_message_newlines_become_breaks() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render(CONTACT_NOTIFICATION, &notification_vars("line one\nline two"))
            .unwrap();
        assert!(rendered.body_html.contains("line one<br>line two"));
        assert!(rendered.body_text.contains("line one\nline two"));
    }

    #[test]
    fn test_message_html_is_escaped() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render(
                CONTACT_NOTIFICATION,
                &notification_vars("<script>alert(1)</script>"),
            )
            .unwrap();
        assert!(!rendered.body_html.contains("<script>"));
        assert!(rendered.body_html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_auto_reply_references_interest() {
        let engine = TemplateEngine::new();
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), json!("Jane"));
        vars.insert(
            "interest".to_string(),
            json!("your interest in cryptocurrency"),
        );
        let rendered = engine.render(CONTACT_AUTO_REPLY, &vars).unwrap();
        assert!(rendered
            .body_html
            .contains("your interest in cryptocurrency"));
        assert!(rendered.body_html.contains("Juniper Broz Investment Services"));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let engine = TemplateEngine::new();
        assert!(engine.render("no_such_template", &HashMap::new()).is_err());
    }
}
