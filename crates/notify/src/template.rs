//! Notification email templates.
//!
//! Each mapped notification type has a `<base>.htm` / `<base>.txt` pair
//! compiled into the binary and rendered with `minijinja`. The subject
//! line lives inside the HTML template between `<subject>` tags and is
//! extracted after rendering, so copy writers keep subject and body
//! together in one file.
//!
//! A notification type with no mapping is a configuration error — the
//! system must not silently drop a type it claims to support.

use minijinja::Environment;
use serde::Serialize;

use fete_core::notification::NotificationType;

/// Template base for password-reset mail, which is not a notification type
/// (it is sent by the reset service, not the dispatcher).
const PASSWORD_RESET_BASE: &str = "password-reset";

/// Error type for template resolution and rendering.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The notification type has no template mapping.
    #[error("No email template mapped for notification type {0:?}")]
    Unmapped(NotificationType),

    /// The template engine failed (bad syntax, missing include).
    #[error("Template render failed: {0}")]
    Render(#[from] minijinja::Error),

    /// The rendered HTML carries no `<subject>` block.
    #[error("Rendered template '{0}' has no <subject> block")]
    MissingSubject(String),
}

/// A rendered subject/body triple ready to hand to the email channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Pull the `<subject>...</subject>` block out of rendered HTML.
///
/// Returns the HTML without the block plus the subject text, or `None`
/// when either tag is missing.
pub fn extract_subject(rendered: &str) -> Option<(String, String)> {
    let start = rendered.find("<subject>")?;
    let end = rendered.find("</subject>")?;
    if end < start {
        return None;
    }
    let subject = rendered[start + "<subject>".len()..end].trim().to_string();
    let mut html = String::with_capacity(rendered.len());
    html.push_str(&rendered[..start]);
    html.push_str(&rendered[end + "</subject>".len()..]);
    Some((html, subject))
}

/// The compiled-in template environment and the type → template mapping.
pub struct TemplateSet {
    env: Environment<'static>,
}

impl TemplateSet {
    /// Build the environment with every built-in template loaded.
    pub fn new() -> Self {
        let mut env = Environment::new();
        let sources: &[(&str, &str)] = &[
            (
                "plan-invitation.htm",
                include_str!("../templates/plan-invitation.htm"),
            ),
            (
                "plan-invitation.txt",
                include_str!("../templates/plan-invitation.txt"),
            ),
            (
                "event-cancelled.htm",
                include_str!("../templates/event-cancelled.htm"),
            ),
            (
                "event-cancelled.txt",
                include_str!("../templates/event-cancelled.txt"),
            ),
            (
                "event-changed.htm",
                include_str!("../templates/event-changed.htm"),
            ),
            (
                "event-changed.txt",
                include_str!("../templates/event-changed.txt"),
            ),
            (
                "activate-email.htm",
                include_str!("../templates/activate-email.htm"),
            ),
            (
                "activate-email.txt",
                include_str!("../templates/activate-email.txt"),
            ),
            (
                "password-reset.htm",
                include_str!("../templates/password-reset.htm"),
            ),
            (
                "password-reset.txt",
                include_str!("../templates/password-reset.txt"),
            ),
        ];
        for (name, source) in sources {
            env.add_template(name, source)
                .expect("built-in template must parse");
        }
        Self { env }
    }

    /// The template base name for a notification type, or `None` for the
    /// reserved types that have no mapping yet.
    pub fn base_name(notification_type: NotificationType) -> Option<&'static str> {
        match notification_type {
            NotificationType::EventInvite => Some("plan-invitation"),
            NotificationType::EventCancel => Some("event-cancelled"),
            NotificationType::EventUpdate => Some("event-changed"),
            NotificationType::AccountEmailValidate => Some("activate-email"),
            // Reserved: declared in the enumeration, not yet mapped.
            NotificationType::EventGuestRsvp | NotificationType::AlbumFileUpload => None,
        }
    }

    /// Render the subject/text/html triple for a notification type.
    pub fn render(
        &self,
        notification_type: NotificationType,
        ctx: impl Serialize,
    ) -> Result<RenderedEmail, TemplateError> {
        let base = Self::base_name(notification_type)
            .ok_or(TemplateError::Unmapped(notification_type))?;
        self.render_base(base, ctx)
    }

    /// Render the password-reset mail (not reachable via a notification
    /// type).
    pub fn render_password_reset(
        &self,
        ctx: impl Serialize,
    ) -> Result<RenderedEmail, TemplateError> {
        self.render_base(PASSWORD_RESET_BASE, ctx)
    }

    fn render_base(&self, base: &str, ctx: impl Serialize) -> Result<RenderedEmail, TemplateError> {
        let ctx = minijinja::Value::from_serialize(&ctx);

        let html_raw = self.env.get_template(&format!("{base}.htm"))?.render(&ctx)?;
        let (html_body, subject) =
            extract_subject(&html_raw).ok_or_else(|| TemplateError::MissingSubject(base.into()))?;
        let text_body = self.env.get_template(&format!("{base}.txt"))?.render(&ctx)?;

        Ok(RenderedEmail {
            subject,
            text_body,
            html_body,
        })
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subject_extraction() {
        let (body, subject) = extract_subject("Hello <subject>Greetings</subject>there.").unwrap();
        assert_eq!(subject, "Greetings");
        assert_eq!(body, "Hello there.");
    }

    #[test]
    fn subject_extraction_fails_without_tags() {
        assert!(extract_subject("no subject here").is_none());
    }

    #[test]
    fn invite_template_renders() {
        let templates = TemplateSet::new();
        let rendered = templates
            .render(
                NotificationType::EventInvite,
                json!({
                    "site_url": "https://fete.example",
                    "register_url": "https://fete.example/register",
                    "account_name": "Ada",
                    "title": "Garden Party",
                    "start_date": "August 7, 2026 at 6:00 (PDT)",
                    "address": "12 Rose Lane",
                    "rsvp_url": "https://fete.example/events/1/rsvp",
                    "host_profile_url": "https://fete.example/profiles/2",
                }),
            )
            .unwrap();
        assert!(rendered.subject.contains("Ada"));
        assert!(rendered.html_body.contains("Garden Party"));
        assert!(rendered.html_body.contains("/events/1/rsvp"));
        assert!(rendered.text_body.contains("/events/1/rsvp"));
        assert!(!rendered.html_body.contains("<subject>"));
    }

    #[test]
    fn every_mapped_type_renders() {
        let templates = TemplateSet::new();
        let ctx = json!({
            "site_url": "s", "register_url": "r", "account_name": "A",
            "title": "T", "start_date": "D", "rsvp_url": "u",
            "host_profile_url": "h", "event_cancelled_url": "c",
            "activation_url": "a", "email": "e@example.com",
        });
        for ntype in [
            NotificationType::EventInvite,
            NotificationType::EventCancel,
            NotificationType::EventUpdate,
            NotificationType::AccountEmailValidate,
        ] {
            let rendered = templates.render(ntype, &ctx).unwrap();
            assert!(!rendered.subject.is_empty(), "{ntype:?} subject empty");
        }
    }

    #[test]
    fn reserved_types_are_unmapped() {
        let templates = TemplateSet::new();
        for ntype in [
            NotificationType::EventGuestRsvp,
            NotificationType::AlbumFileUpload,
        ] {
            match templates.render(ntype, json!({})) {
                Err(TemplateError::Unmapped(t)) => assert_eq!(t, ntype),
                other => panic!("expected Unmapped, got {other:?}"),
            }
        }
    }

    #[test]
    fn password_reset_renders() {
        let templates = TemplateSet::new();
        let rendered = templates
            .render_password_reset(json!({
                "reset_url": "https://fete.example/reset-password/1?t=tok",
                "contact_email": "noreply@fete.local",
            }))
            .unwrap();
        assert!(rendered.text_body.contains("reset-password"));
        assert!(rendered.subject.to_lowercase().contains("password"));
    }
}
