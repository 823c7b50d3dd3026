//! Notification routing and per-recipient delivery.
//!
//! [`Dispatcher::fan_out`] turns one intent into one queued job per
//! recipient; [`Dispatcher::deliver`] executes a single recipient's
//! delivery inside such a job. The two halves never share state, so a slow
//! or failing recipient cannot hold up the others.
//!
//! Delivery rules, per recipient:
//!
//! 1. an in-app audit record is always written (best-effort);
//! 2. the recipient's category preference and account status gate all
//!    external channels;
//! 3. channel choice is email-first — a recipient with both endpoints gets
//!    exactly one email and never an SMS for the same intent;
//! 4. a notification type with no template mapping fails the delivery
//!    fatally, since retrying cannot conjure a template.

use std::sync::Arc;

use chrono::TimeZone;
use chrono_tz::Tz;
use serde_json::json;
use uuid::Uuid;

use fete_core::error::CoreError;
use fete_core::notification::{NotificationIntent, NotificationType, SubjectRef};
use fete_core::types::{DbId, Timestamp};

use fete_db::models::account::{Account, AccountSettings};
use fete_db::models::event::Event;
use fete_db::models::status::AccountStatus;

use crate::audit::AuditSink;
use crate::channel::{ChannelError, EmailChannel, OutboundEmail, SmsChannel};
use crate::queue::{DeliverJob, JobHandle, JobQueue, QueueError};
use crate::template::{TemplateError, TemplateSet};
use crate::urls::UrlBuilder;

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// A resolved delivery target: account contact endpoints, status, and the
/// notification preferences relevant to channel selection.
///
/// `guest_token` is the recipient's access token for the subject event,
/// when the recipient is a guest of it. It only ends up in URLs for
/// recipients without a full active account.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub account_id: DbId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: AccountStatus,
    pub email_rsvp_updates: bool,
    pub email_social_activity: bool,
    pub guest_token: Option<Uuid>,
}

impl Recipient {
    /// Build a recipient from its account row, settings, and (optionally)
    /// the guest relation's token.
    pub fn resolve(
        account: &Account,
        settings: &AccountSettings,
        guest_token: Option<Uuid>,
    ) -> Result<Self, CoreError> {
        let status = AccountStatus::from_id(account.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "account {} has unknown status {}",
                account.id, account.status
            ))
        })?;
        Ok(Self {
            account_id: account.id,
            name: account.display_name().map(str::to_string),
            email: account.email.clone(),
            phone: account.phone.clone(),
            status,
            email_rsvp_updates: settings.email_rsvp_updates,
            email_social_activity: settings.email_social_activity,
            guest_token,
        })
    }

    /// Whether the recipient's preference for this notification category
    /// is enabled. RSVP-type notifications have their own toggle; every
    /// other type falls under social activity.
    fn category_enabled(&self, notification_type: NotificationType) -> bool {
        match notification_type {
            NotificationType::EventGuestRsvp => self.email_rsvp_updates,
            _ => self.email_social_activity,
        }
    }
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

/// Subject-event fields needed to build notification copy and URLs.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event_id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub start: Timestamp,
    pub timezone: String,
    pub location: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
}

impl EventContext {
    /// Capture the context from an event row and its owner's account.
    pub fn of(event: &Event, owner: &Account) -> Self {
        Self {
            event_id: event.id,
            owner_id: event.owner_id,
            title: event.title.clone(),
            start: event.start,
            timezone: event.timezone.clone(),
            location: event.location.clone(),
            owner_name: owner.display_name().map(str::to_string),
            owner_phone: owner.phone.clone(),
        }
    }

    /// The event start rendered in the event's own timezone, e.g.
    /// `August 7, 2026 at 6:30 (PDT)`. An unknown zone name falls back to
    /// UTC.
    fn formatted_start(&self) -> String {
        let tz: Tz = self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "Unknown event timezone, formatting as UTC");
            chrono_tz::UTC
        });
        tz.from_utc_datetime(&self.start.naive_utc())
            .format("%B %-d, %Y at %-I:%M (%Z)")
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Errors and reports
// ---------------------------------------------------------------------------

/// Error type for dispatch and delivery.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The type has no dispatch route / template mapping. A configuration
    /// error: retrying cannot fix it.
    #[error("No dispatch route for notification type {0:?} (configuration error)")]
    UnmappedType(NotificationType),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// External channel failure; surfaces as job failure so the queue's
    /// redelivery policy applies.
    #[error("Channel delivery failed: {0}")]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Which external channel, if any, carried a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalDelivery {
    Email,
    Sms,
    /// Preferences, status, or missing endpoints ruled out every external
    /// channel; only the in-app record was written.
    Skipped,
}

/// Outcome of one per-recipient delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Id of the in-app audit record, or `None` if the (best-effort)
    /// audit write failed.
    pub audit_id: Option<DbId>,
    pub external: ExternalDelivery,
}

/// Routable event-subject notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventRoute {
    Invite,
    Cancel,
    Update,
}

impl EventRoute {
    fn of(notification_type: NotificationType) -> Option<Self> {
        match notification_type {
            NotificationType::EventInvite => Some(Self::Invite),
            NotificationType::EventCancel => Some(Self::Cancel),
            NotificationType::EventUpdate => Some(Self::Update),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes notification intents to recipients through collaborator traits.
pub struct Dispatcher {
    audit: Arc<dyn AuditSink>,
    email: Arc<dyn EmailChannel>,
    sms: Arc<dyn SmsChannel>,
    templates: Arc<TemplateSet>,
    urls: UrlBuilder,
    queue: Arc<dyn JobQueue>,
}

impl Dispatcher {
    pub fn new(
        audit: Arc<dyn AuditSink>,
        email: Arc<dyn EmailChannel>,
        sms: Arc<dyn SmsChannel>,
        templates: Arc<TemplateSet>,
        urls: UrlBuilder,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            audit,
            email,
            sms,
            templates,
            urls,
            queue,
        }
    }

    /// Consume an intent: enqueue one delivery job per recipient.
    ///
    /// Each job is an independent unit of work; ordering across recipients
    /// is neither guaranteed nor required.
    pub async fn fan_out(&self, intent: &NotificationIntent) -> Result<Vec<JobHandle>, QueueError> {
        let mut handles = Vec::with_capacity(intent.recipient_ids.len());
        for &recipient_id in &intent.recipient_ids {
            let job = DeliverJob {
                notification_type: intent.notification_type,
                sender_id: intent.sender_id,
                recipient_id,
                subject: intent.subject,
            };
            handles.push(self.queue.enqueue(job.into_spec()?).await?);
        }
        tracing::info!(
            notification_type = ?intent.notification_type,
            subject_kind = intent.subject.kind(),
            subject_id = intent.subject.id(),
            recipients = handles.len(),
            "Notification fan-out enqueued",
        );
        Ok(handles)
    }

    /// Run one recipient's delivery.
    ///
    /// Invoked by the worker for each `notify.deliver` job. The in-app
    /// audit record is written unconditionally; external channels depend on
    /// preferences, account status, and available endpoints.
    pub async fn deliver(
        &self,
        notification_type: NotificationType,
        sender_id: DbId,
        recipient: &Recipient,
        subject: SubjectRef,
        event: &EventContext,
    ) -> Result<DeliveryReport, DispatchError> {
        let audit_id = match self
            .audit
            .record(sender_id, recipient.account_id, notification_type, subject)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    recipient_id = recipient.account_id,
                    error = %e,
                    "In-app audit write failed; continuing with external delivery",
                );
                None
            }
        };

        let route = EventRoute::of(notification_type)
            .ok_or(DispatchError::UnmappedType(notification_type))?;

        if !recipient.status.receives_external_notifications()
            || !recipient.category_enabled(notification_type)
        {
            return Ok(DeliveryReport {
                audit_id,
                external: ExternalDelivery::Skipped,
            });
        }

        if let Some(to_email) = recipient.email.clone() {
            let ctx = self.email_context(route, recipient, event, &to_email);
            let rendered = self.templates.render(notification_type, ctx)?;
            self.email
                .send(&OutboundEmail {
                    to: to_email,
                    subject: rendered.subject,
                    text_body: rendered.text_body,
                    html_body: rendered.html_body,
                })
                .await?;
            Ok(DeliveryReport {
                audit_id,
                external: ExternalDelivery::Email,
            })
        } else if let Some(phone) = recipient.phone.clone() {
            let body = self.sms_text(route, recipient, event);
            self.sms.send(&phone, &body).await?;
            Ok(DeliveryReport {
                audit_id,
                external: ExternalDelivery::Sms,
            })
        } else {
            Ok(DeliveryReport {
                audit_id,
                external: ExternalDelivery::Skipped,
            })
        }
    }

    /// RSVP URL for this recipient: guests without an active account get
    /// their access token embedded so they can answer without logging in.
    fn rsvp_url_for(&self, recipient: &Recipient, event_id: DbId) -> String {
        let token = if recipient.status == AccountStatus::Active {
            None
        } else {
            recipient.guest_token
        };
        self.urls.event_rsvp_url(event_id, token)
    }

    fn email_context(
        &self,
        route: EventRoute,
        recipient: &Recipient,
        event: &EventContext,
        to_email: &str,
    ) -> serde_json::Value {
        let mut ctx = json!({
            "site_url": self.urls.site_url(),
            "to_email": to_email,
            "register_url": self.urls.register_url(),
            "title": event.title,
        });
        let extra = match route {
            EventRoute::Invite | EventRoute::Update => json!({
                "account_name": event.owner_name,
                "start_date": event.formatted_start(),
                "address": event.location,
                "phone": event.owner_phone,
                "rsvp_url": self.rsvp_url_for(recipient, event.event_id),
                "host_profile_url": self.urls.host_profile_url(event.owner_id),
            }),
            EventRoute::Cancel => json!({
                "event_cancelled_url": self.urls.event_cancelled_url(event.event_id),
            }),
        };
        merge(&mut ctx, extra);
        ctx
    }

    fn sms_text(&self, route: EventRoute, recipient: &Recipient, event: &EventContext) -> String {
        match route {
            EventRoute::Invite => {
                let rsvp_url = self.rsvp_url_for(recipient, event.event_id);
                match &event.owner_name {
                    Some(name) => format!("{name} has invited you to an event.\n{rsvp_url}"),
                    None => format!("You have been invited to an event.\n{rsvp_url}"),
                }
            }
            EventRoute::Cancel => {
                let url = self.urls.event_cancelled_url(event.event_id);
                match &event.owner_name {
                    Some(name) => format!("{name} has cancelled an event.\n{url}"),
                    None => format!("The event \"{}\" has been cancelled.\n{url}", event.title),
                }
            }
            EventRoute::Update => {
                let rsvp_url = self.rsvp_url_for(recipient, event.event_id);
                match &event.owner_name {
                    Some(name) => {
                        format!("{name} has changed an event you are invited to.\n{rsvp_url}")
                    }
                    None => format!("An event you are invited to has changed.\n{rsvp_url}"),
                }
            }
        }
    }
}

/// Shallow-merge `extra`'s keys into `base` (both must be objects).
fn merge(base: &mut serde_json::Value, extra: serde_json::Value) {
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
