//! In-memory recording channels.
//!
//! Drop-in [`EmailChannel`]/[`SmsChannel`] implementations that append to a
//! shared vector instead of talking to a transport. Used throughout the
//! test suites and handy for local development without SMTP/Twilio
//! credentials. A channel can be flipped to fail-mode to exercise error
//! paths.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChannelError, EmailChannel, OutboundEmail, SmsChannel};

/// Records every email instead of sending it.
#[derive(Default)]
pub struct MemoryEmailChannel {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: Mutex<bool>,
}

impl MemoryEmailChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Make subsequent sends fail with a transport error.
    pub fn fail_next_sends(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl EmailChannel for MemoryEmailChannel {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ChannelError> {
        if *self.fail.lock().unwrap() {
            return Err(ChannelError::Transport("memory channel set to fail".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// One recorded SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSms {
    pub to: String,
    pub body: String,
}

/// Records every SMS instead of sending it.
#[derive(Default)]
pub struct MemorySmsChannel {
    sent: Mutex<Vec<RecordedSms>>,
    fail: Mutex<bool>,
}

impl MemorySmsChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<RecordedSms> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next_sends(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl SmsChannel for MemorySmsChannel {
    async fn send(&self, to_e164: &str, body: &str) -> Result<(), ChannelError> {
        if *self.fail.lock().unwrap() {
            return Err(ChannelError::Transport("memory channel set to fail".into()));
        }
        self.sent.lock().unwrap().push(RecordedSms {
            to: to_e164.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
