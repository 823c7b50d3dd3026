//! Before/after change detection for notifiable entities.
//!
//! Callers capture an [`EventSnapshot`] before applying a mutation, capture
//! another afterwards, and hand both to [`detect_event_change`] at the point
//! of mutation. Comparison never fails and produces at most one intent; a
//! field re-assigned to its existing value is not a change.

use fete_core::notification::{NotificationIntent, NotificationType, SubjectRef};
use fete_core::types::{DbId, Timestamp};

use fete_db::models::event::Event;
use fete_db::models::status::{EventStatus, StatusId};

// ---------------------------------------------------------------------------
// EventSnapshot
// ---------------------------------------------------------------------------

/// The tracked fields of an event: the ones whose movement guests care
/// about. Everything else (title, featured photo, ...) changes silently.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSnapshot {
    pub start: Timestamp,
    pub end: Timestamp,
    pub timezone: String,
    pub privacy: StatusId,
    pub status: StatusId,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_all_day: bool,
}

impl EventSnapshot {
    /// Capture the tracked fields of an event row.
    pub fn of(event: &Event) -> Self {
        Self {
            start: event.start,
            end: event.end,
            timezone: event.timezone.clone(),
            privacy: event.privacy,
            status: event.status,
            location: event.location.clone(),
            lat: event.lat,
            lon: event.lon,
            is_all_day: event.is_all_day,
        }
    }

    fn is_active(&self) -> bool {
        self.status == EventStatus::Active.id()
    }

    fn is_ended(&self) -> bool {
        self.status == EventStatus::Cancelled.id() || self.status == EventStatus::Deleted.id()
    }
}

/// Compare two event snapshots and produce the notification intent the
/// transition calls for, if any.
///
/// - draft → active announces the event: one EventInvite to every current
///   guest, never an EventUpdate.
/// - any transition into cancelled/deleted yields an EventCancel.
/// - a tracked-field change on an already-active event yields an
///   EventUpdate.
/// - identical snapshots yield nothing.
pub fn detect_event_change(
    event_id: DbId,
    owner_id: DbId,
    guest_ids: &[DbId],
    before: &EventSnapshot,
    after: &EventSnapshot,
) -> Option<NotificationIntent> {
    let subject = SubjectRef::Event(event_id);

    if !before.is_active() && !before.is_ended() && after.is_active() {
        return Some(NotificationIntent::new(
            NotificationType::EventInvite,
            owner_id,
            guest_ids.to_vec(),
            subject,
        ));
    }

    if after.is_ended() && !before.is_ended() {
        return Some(NotificationIntent::new(
            NotificationType::EventCancel,
            owner_id,
            guest_ids.to_vec(),
            subject,
        ));
    }

    if before.is_active() && after.is_active() && before != after {
        return Some(NotificationIntent::new(
            NotificationType::EventUpdate,
            owner_id,
            guest_ids.to_vec(),
            subject,
        ));
    }

    None
}

// ---------------------------------------------------------------------------
// GuestSnapshot
// ---------------------------------------------------------------------------

/// The single tracked field of a guest relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestSnapshot {
    pub rsvp: StatusId,
}

/// Compare guest snapshots around an RSVP mutation.
///
/// Produces an EventGuestRsvp intent addressed to the event owner. The type
/// is reserved — no template is mapped, so the intent is not currently
/// routed anywhere; handing it to the dispatcher surfaces the
/// unmapped-type configuration error.
pub fn detect_rsvp_change(
    event_id: DbId,
    owner_id: DbId,
    guest_account_id: DbId,
    before: GuestSnapshot,
    after: GuestSnapshot,
) -> Option<NotificationIntent> {
    if before == after {
        return None;
    }
    Some(NotificationIntent::new(
        NotificationType::EventGuestRsvp,
        guest_account_id,
        vec![owner_id],
        SubjectRef::Event(event_id),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fete_db::models::status::{Privacy, RsvpStatus};

    fn snapshot(status: EventStatus) -> EventSnapshot {
        let start = Utc::now();
        EventSnapshot {
            start,
            end: start + Duration::hours(2),
            timezone: "America/Los_Angeles".to_string(),
            privacy: Privacy::Public.id(),
            status: status.id(),
            location: Some("Dolores Park".to_string()),
            lat: Some(37.7596),
            lon: Some(-122.4269),
            is_all_day: false,
        }
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let before = snapshot(EventStatus::Active);
        let after = before.clone();
        assert_eq!(detect_event_change(1, 10, &[20, 21], &before, &after), None);
    }

    #[test]
    fn reassigning_same_values_is_not_a_change() {
        let before = snapshot(EventStatus::Active);
        let mut after = before.clone();
        // A save that rewrites the location with the identical string.
        after.location = Some("Dolores Park".to_string());
        assert_eq!(detect_event_change(1, 10, &[20], &before, &after), None);
    }

    #[test]
    fn draft_to_active_announces_with_invite() {
        let before = snapshot(EventStatus::Draft);
        let after = snapshot(EventStatus::Active);
        let intent = detect_event_change(1, 10, &[20, 21], &before, &after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventInvite);
        assert_eq!(intent.sender_id, 10);
        assert_eq!(intent.recipient_ids, vec![20, 21]);
        assert_eq!(intent.subject, SubjectRef::Event(1));
    }

    #[test]
    fn draft_to_active_with_field_edits_is_still_invite() {
        let before = snapshot(EventStatus::Draft);
        let mut after = snapshot(EventStatus::Active);
        after.location = Some("Golden Gate Park".to_string());
        let intent = detect_event_change(1, 10, &[20], &before, &after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventInvite);
    }

    #[test]
    fn tracked_field_change_while_active_is_update() {
        let before = snapshot(EventStatus::Active);
        let mut after = before.clone();
        after.start = after.start + Duration::hours(1);
        let intent = detect_event_change(1, 10, &[20], &before, &after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventUpdate);
    }

    #[test]
    fn cancellation_wins_over_update() {
        let before = snapshot(EventStatus::Active);
        let mut after = snapshot(EventStatus::Cancelled);
        after.location = None;
        let intent = detect_event_change(1, 10, &[20], &before, &after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventCancel);
    }

    #[test]
    fn deletion_also_cancels() {
        let before = snapshot(EventStatus::Active);
        let after = snapshot(EventStatus::Deleted);
        let intent = detect_event_change(1, 10, &[20], &before, &after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventCancel);
    }

    #[test]
    fn edits_to_a_draft_stay_silent() {
        let before = snapshot(EventStatus::Draft);
        let mut after = before.clone();
        after.is_all_day = true;
        assert_eq!(detect_event_change(1, 10, &[20], &before, &after), None);
    }

    #[test]
    fn replayed_cancellation_produces_nothing() {
        let before = snapshot(EventStatus::Cancelled);
        let after = snapshot(EventStatus::Cancelled);
        assert_eq!(detect_event_change(1, 10, &[20], &before, &after), None);
    }

    #[test]
    fn rsvp_change_targets_the_owner() {
        let before = GuestSnapshot {
            rsvp: RsvpStatus::Undecided.id(),
        };
        let after = GuestSnapshot {
            rsvp: RsvpStatus::Yes.id(),
        };
        let intent = detect_rsvp_change(5, 10, 20, before, after).unwrap();
        assert_eq!(intent.notification_type, NotificationType::EventGuestRsvp);
        assert_eq!(intent.sender_id, 20);
        assert_eq!(intent.recipient_ids, vec![10]);
    }

    #[test]
    fn unchanged_rsvp_produces_nothing() {
        let snap = GuestSnapshot {
            rsvp: RsvpStatus::Maybe.id(),
        };
        assert_eq!(detect_rsvp_change(5, 10, 20, snap, snap), None);
    }
}
