//! Handlebars rendering for the two contact emails.
//!
//! Templates are compiled into the binary. The HTML registry escapes every
//! `{{value}}`; the plain-text registry does not.

use handlebars::{
    handlebars_helper, html_escape, no_escape, Handlebars, RenderError, TemplateError,
};
use serde::Serialize;

use super::MailError;

const NOTIFICATION: &str = "contact_notification";
const AUTO_REPLY: &str = "auto_reply";

const NOTIFICATION_HTML: &str = include_str!("../../../templates/contact_notification.html.hbs");
const NOTIFICATION_TEXT: &str = include_str!("../../../templates/contact_notification.txt.hbs");
const AUTO_REPLY_HTML: &str = include_str!("../../../templates/auto_reply.html.hbs");
const AUTO_REPLY_TEXT: &str = include_str!("../../../templates/auto_reply.txt.hbs");

// Escapes first, then turns newlines into <br>; use with a triple-stash.
handlebars_helper!(nl2br: |text: str| html_escape(text).replace("\r\n", "\n").replace('\n', "<br>"));

#[derive(Debug, Serialize)]
pub struct NotificationContext<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
    pub submitted_at: String,
    pub ip_address: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AutoReplyContext<'a> {
    pub name: &'a str,
    pub owner_name: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub html_body: String,
    pub text_body: String,
}

pub struct EmailTemplates {
    html: Handlebars<'static>,
    text: Handlebars<'static>,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, MailError> {
        let mut html = Handlebars::new();
        html.set_strict_mode(true);
        html.register_helper("nl2br", Box::new(nl2br));
        html.register_template_string(NOTIFICATION, NOTIFICATION_HTML)
            .map_err(template_error)?;
        html.register_template_string(AUTO_REPLY, AUTO_REPLY_HTML)
            .map_err(template_error)?;

        let mut text = Handlebars::new();
        text.set_strict_mode(true);
        text.register_escape_fn(no_escape);
        text.register_template_string(NOTIFICATION, NOTIFICATION_TEXT)
            .map_err(template_error)?;
        text.register_template_string(AUTO_REPLY, AUTO_REPLY_TEXT)
            .map_err(template_error)?;

        Ok(EmailTemplates { html, text })
    }

    pub fn render_notification(&self, ctx: &NotificationContext<'_>) -> Result<RenderedEmail, MailError> {
        self.render(NOTIFICATION, ctx)
    }

    pub fn render_auto_reply(&self, ctx: &AutoReplyContext<'_>) -> Result<RenderedEmail, MailError> {
        self.render(AUTO_REPLY, ctx)
    }

    fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<RenderedEmail, MailError> {
        Ok(RenderedEmail {
            html_body: self.html.render(name, ctx).map_err(render_error)?,
            text_body: self.text.render(name, ctx).map_err(render_error)?,
        })
    }
}

fn template_error(err: TemplateError) -> MailError {
    MailError::Template(err.to_string())
}

fn render_error(err: RenderError) -> MailError {
    MailError::Template(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification<'a>(message: &'a str, name: &'a str) -> NotificationContext<'a> {
        NotificationContext {
            name,
            email: "ada@example.com",
            message,
            submitted_at: "2026-01-01 10:00:00 UTC".into(),
            ip_address: "203.0.113.9",
        }
    }

    #[test]
    fn notification_escapes_user_input() {
        let templates = EmailTemplates::new().unwrap();
        let rendered = templates
            .render_notification(&notification("<script>alert(1)</script>", "Ada <b>"))
            .unwrap();

        assert!(!rendered.html_body.contains("<script>"));
        assert!(rendered.html_body.contains("&lt;script&gt;"));
        assert!(rendered.html_body.contains("Ada &lt;b&gt;"));
        assert!(rendered.html_body.contains("203.0.113.9"));
    }

    #[test]
    fn notification_keeps_line_breaks() {
        let templates = EmailTemplates::new().unwrap();
        let rendered = templates
            .render_notification(&notification("first line\nsecond line", "Ada"))
            .unwrap();

        assert!(rendered.html_body.contains("first line<br>second line"));
        assert!(rendered.text_body.contains("first line\nsecond line"));
    }

    #[test]
    fn auto_reply_greets_sender_and_signs_with_owner() {
        let templates = EmailTemplates::new().unwrap();
        let rendered = templates
            .render_auto_reply(&AutoReplyContext { name: "Ada & Co", owner_name: "Grace Hopper" })
            .unwrap();

        assert!(rendered.html_body.contains("Dear Ada &amp; Co,"));
        assert!(rendered.html_body.contains("Grace Hopper"));
        assert!(rendered.text_body.contains("Dear Ada & Co,"));
    }
}
