//! Email-address validation flow.
//!
//! Opens a `comm_channels` validation round, mails the activation link,
//! and stamps the send time. The account proves ownership later by
//! presenting the validation token; that exchange lives in the API layer.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use fete_core::types::DbId;

use fete_db::models::comm_channel::CommChannel;
use fete_db::models::status::CommChannelKind;
use fete_db::repositories::CommChannelRepo;

use crate::channel::{ChannelError, EmailChannel, OutboundEmail};
use crate::template::{TemplateError, TemplateSet};
use crate::urls::UrlBuilder;

/// Error type for the validation-mail flow.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Validation email delivery failed: {0}")]
    Channel(#[from] ChannelError),
}

/// Sends email-validation messages.
pub struct EmailValidator {
    pool: PgPool,
    templates: Arc<TemplateSet>,
    email: Arc<dyn EmailChannel>,
    urls: UrlBuilder,
}

impl EmailValidator {
    pub fn new(
        pool: PgPool,
        templates: Arc<TemplateSet>,
        email: Arc<dyn EmailChannel>,
        urls: UrlBuilder,
    ) -> Self {
        Self {
            pool,
            templates,
            email,
            urls,
        }
    }

    /// Open a validation round for `email` and send the activation link.
    ///
    /// Returns the created `comm_channels` row with its send time stamped.
    pub async fn send_validation_email(
        &self,
        account_id: DbId,
        email: &str,
    ) -> Result<CommChannel, ValidationError> {
        let token = Uuid::new_v4();
        let channel = CommChannelRepo::create(
            &self.pool,
            account_id,
            CommChannelKind::Email.id(),
            email,
            token,
        )
        .await?;

        let rendered = self.templates.render(
            fete_core::NotificationType::AccountEmailValidate,
            serde_json::json!({
                "site_url": self.urls.site_url(),
                "activation_url": self.urls.activation_url(token),
                "email": email,
                "register_url": self.urls.register_url(),
            }),
        )?;

        self.email
            .send(&OutboundEmail {
                to: email.to_string(),
                subject: rendered.subject,
                text_body: rendered.text_body,
                html_body: rendered.html_body,
            })
            .await?;

        CommChannelRepo::mark_message_sent(&self.pool, channel.id).await?;
        tracing::info!(account_id, channel_id = channel.id, "Validation email sent");
        Ok(channel)
    }
}
