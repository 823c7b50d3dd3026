//! Outbound delivery channels.
//!
//! The dispatcher speaks to transports through [`EmailChannel`] and
//! [`SmsChannel`]; production wiring uses [`email::SmtpEmailChannel`] and
//! [`sms::TwilioSmsChannel`], tests use the recording channels in
//! [`memory`]. A transport error bubbles out of the delivery job so the
//! queue's redelivery policy applies — channels never retry internally.

use async_trait::async_trait;

pub mod email;
pub mod memory;
pub mod sms;

/// A fully rendered email ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Error type for channel delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The recipient address/number was rejected before any send.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Transport-level failure (SMTP, HTTP, provider API).
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Sends rendered emails.
#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ChannelError>;
}

/// Sends short text messages to E.164-normalized numbers.
#[async_trait]
pub trait SmsChannel: Send + Sync {
    async fn send(&self, to_e164: &str, body: &str) -> Result<(), ChannelError>;
}
