//! SMS delivery through the Twilio Messages REST API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{ChannelError, SmsChannel};

/// Default Twilio API base URL; overridable for tests and mock servers.
const DEFAULT_API_BASE: &str = "https://api.twilio.com";

// ---------------------------------------------------------------------------
// TwilioConfig
// ---------------------------------------------------------------------------

/// Configuration for the Twilio SMS channel.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// E.164 number messages are sent from.
    pub from_number: String,
    pub api_base_url: String,
}

impl TwilioConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `TWILIO_ACCOUNT_SID` is not set, signalling that
    /// SMS delivery is not configured.
    ///
    /// | Variable             | Required | Default                   |
    /// |----------------------|----------|---------------------------|
    /// | `TWILIO_ACCOUNT_SID` | yes      | —                         |
    /// | `TWILIO_AUTH_TOKEN`  | yes      | —                         |
    /// | `TWILIO_FROM_NUMBER` | yes      | —                         |
    /// | `TWILIO_API_BASE`    | no       | `https://api.twilio.com`  |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            from_number: std::env::var("TWILIO_FROM_NUMBER").ok()?,
            api_base_url: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// TwilioSmsChannel
// ---------------------------------------------------------------------------

/// Subset of the Twilio message-resource response we care about.
#[derive(Debug, Deserialize)]
struct TwilioResponse {
    sid: Option<String>,
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// Sends SMS messages via the Twilio REST API.
pub struct TwilioSmsChannel {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioSmsChannel {
    pub fn new(config: TwilioConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsChannel for TwilioSmsChannel {
    async fn send(&self, to_e164: &str, body: &str) -> Result<(), ChannelError> {
        if !to_e164.starts_with('+') {
            return Err(ChannelError::InvalidRecipient(format!(
                "not an E.164 number: {to_e164}"
            )));
        }

        let params = [
            ("To", to_e164),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Transport(format!("HTTP {status}: {body}")));
        }

        let parsed: TwilioResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        if let Some(code) = parsed.error_code {
            let msg = parsed
                .error_message
                .unwrap_or_else(|| format!("error code {code}"));
            return Err(ChannelError::Transport(msg));
        }

        tracing::info!(to = to_e164, sid = ?parsed.sid, "SMS sent");
        Ok(())
    }
}
