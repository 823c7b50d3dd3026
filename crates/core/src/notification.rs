//! Notification vocabulary shared by the change detector, the dispatcher,
//! and the background worker.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Notification type ID matching SMALLINT in the database.
pub type NotificationTypeId = i16;

/// The closed set of notification types.
///
/// Discriminants are stored in the `in_app_notifications.notification_type`
/// column, so they are part of the schema and must not be renumbered.
///
/// `EventGuestRsvp` and `AlbumFileUpload` are reserved: the change detector
/// can produce them but no template mapping exists yet, so dispatching one
/// is a configuration error.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    EventInvite = 1,
    EventCancel = 2,
    EventUpdate = 3,
    EventGuestRsvp = 4,
    AlbumFileUpload = 5,
    AccountEmailValidate = 6,
}

impl NotificationType {
    /// Return the database discriminant.
    pub fn id(self) -> NotificationTypeId {
        self as NotificationTypeId
    }

    /// Look up a type by its database discriminant.
    pub fn from_id(id: NotificationTypeId) -> Option<Self> {
        match id {
            1 => Some(Self::EventInvite),
            2 => Some(Self::EventCancel),
            3 => Some(Self::EventUpdate),
            4 => Some(Self::EventGuestRsvp),
            5 => Some(Self::AlbumFileUpload),
            6 => Some(Self::AccountEmailValidate),
            _ => None,
        }
    }
}

/// A typed reference to the entity a notification is about.
///
/// Replaces a generic "content type + object id" lookup with a closed set of
/// subject kinds; consumers dispatch by exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubjectRef {
    Event(DbId),
    AlbumFile(DbId),
    Account(DbId),
}

impl SubjectRef {
    /// Stable kind tag, used for audit rows and logging.
    pub fn kind(self) -> &'static str {
        match self {
            SubjectRef::Event(_) => "event",
            SubjectRef::AlbumFile(_) => "albumfile",
            SubjectRef::Account(_) => "account",
        }
    }

    /// The referenced entity's database id.
    pub fn id(self) -> DbId {
        match self {
            SubjectRef::Event(id) | SubjectRef::AlbumFile(id) | SubjectRef::Account(id) => id,
        }
    }
}

/// An in-memory request to notify a set of recipients about a subject.
///
/// Produced by the change detector (or directly by a lifecycle transition
/// such as inviting a guest) and consumed exactly once by the dispatcher's
/// fan-out. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub notification_type: NotificationType,
    pub sender_id: DbId,
    pub recipient_ids: Vec<DbId>,
    pub subject: SubjectRef,
}

impl NotificationIntent {
    pub fn new(
        notification_type: NotificationType,
        sender_id: DbId,
        recipient_ids: Vec<DbId>,
        subject: SubjectRef,
    ) -> Self {
        Self {
            notification_type,
            sender_id,
            recipient_ids,
            subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_round_trip() {
        for ntype in [
            NotificationType::EventInvite,
            NotificationType::EventCancel,
            NotificationType::EventUpdate,
            NotificationType::EventGuestRsvp,
            NotificationType::AlbumFileUpload,
            NotificationType::AccountEmailValidate,
        ] {
            assert_eq!(NotificationType::from_id(ntype.id()), Some(ntype));
        }
        assert_eq!(NotificationType::from_id(0), None);
        assert_eq!(NotificationType::from_id(99), None);
    }

    #[test]
    fn event_invite_is_type_one() {
        // The mobile clients match on the raw discriminant.
        assert_eq!(NotificationType::EventInvite.id(), 1);
    }

    #[test]
    fn subject_ref_serializes_tagged() {
        let subject = SubjectRef::Event(42);
        let json = serde_json::to_value(subject).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "event", "id": 42}));

        let back: SubjectRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, subject);
    }

    #[test]
    fn subject_ref_kind_and_id() {
        assert_eq!(SubjectRef::AlbumFile(7).kind(), "albumfile");
        assert_eq!(SubjectRef::AlbumFile(7).id(), 7);
        assert_eq!(SubjectRef::Account(3).kind(), "account");
    }
}
