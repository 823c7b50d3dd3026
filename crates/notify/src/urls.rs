//! Frontend URL construction.
//!
//! Notification bodies link back into the web app; this is the single
//! place those URLs are assembled. For guests without a full active
//! account, the RSVP link carries the guest's opaque access token so they
//! can answer without logging in.

use uuid::Uuid;

use fete_core::types::DbId;

/// Default site base URL for local development.
const DEFAULT_SITE_URL: &str = "http://localhost:5173";

/// Builds absolute frontend URLs from a configured site base.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    site_url: String,
}

impl UrlBuilder {
    /// Create a builder; a trailing slash on the base is dropped.
    pub fn new(site_url: impl Into<String>) -> Self {
        let mut site_url = site_url.into();
        while site_url.ends_with('/') {
            site_url.pop();
        }
        Self { site_url }
    }

    /// Load from the `SITE_URL` environment variable
    /// (default `http://localhost:5173`).
    pub fn from_env() -> Self {
        Self::new(std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string()))
    }

    /// The configured site base.
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// RSVP page for an event. `token` is the guest access token for
    /// recipients without an active account; active accounts get the bare
    /// URL and authenticate instead.
    pub fn event_rsvp_url(&self, event_id: DbId, token: Option<Uuid>) -> String {
        match token {
            Some(token) => format!("{}/events/{event_id}/rsvp?t={token}", self.site_url),
            None => format!("{}/events/{event_id}/rsvp", self.site_url),
        }
    }

    /// Landing page shown for a cancelled event.
    pub fn event_cancelled_url(&self, event_id: DbId) -> String {
        format!("{}/events/{event_id}/cancelled", self.site_url)
    }

    /// Public profile of an event host.
    pub fn host_profile_url(&self, account_id: DbId) -> String {
        format!("{}/profiles/{account_id}", self.site_url)
    }

    /// Email-validation landing page for a validation token.
    pub fn activation_url(&self, token: Uuid) -> String {
        format!("{}/validate?t={token}", self.site_url)
    }

    /// Password-reset landing page for a reset request and its token.
    pub fn password_reset_url(&self, reset_id: DbId, token: &str) -> String {
        format!("{}/reset-password/{reset_id}?t={token}", self.site_url)
    }

    /// Sign-up page.
    pub fn register_url(&self) -> String {
        format!("{}/register", self.site_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let urls = UrlBuilder::new("https://fete.example/");
        assert_eq!(urls.site_url(), "https://fete.example");
    }

    #[test]
    fn rsvp_url_embeds_token_only_when_given() {
        let urls = UrlBuilder::new("https://fete.example");
        let token = Uuid::nil();
        assert_eq!(
            urls.event_rsvp_url(7, Some(token)),
            format!("https://fete.example/events/7/rsvp?t={token}")
        );
        assert_eq!(
            urls.event_rsvp_url(7, None),
            "https://fete.example/events/7/rsvp"
        );
    }

    #[test]
    fn reset_url_carries_request_id_and_token() {
        let urls = UrlBuilder::new("https://fete.example");
        assert_eq!(
            urls.password_reset_url(12, "abc123"),
            "https://fete.example/reset-password/12?t=abc123"
        );
    }
}
