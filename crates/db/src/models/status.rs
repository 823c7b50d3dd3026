//! Status helper enums mapping to SMALLINT columns.
//!
//! Discriminants are part of the schema (and of the mobile API payloads
//! built on top of it), so variants must never be renumbered. Gaps in the
//! numbering are inherited from the original data and are intentional.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Account lifecycle status.
    AccountStatus {
        /// Stub record for an invited person who has not signed up.
        Contact = -1,
        SignedUp = 0,
        Deleted = 2,
        Active = 3,
        DeactivatedForcefully = 5,
    }
}

impl AccountStatus {
    /// Whether an account in this status may receive external
    /// (email/SMS) notifications.
    pub fn receives_external_notifications(self) -> bool {
        self == AccountStatus::Active
    }
}

define_status_enum! {
    /// Event lifecycle status.
    EventStatus {
        Draft = 1,
        Active = 2,
        Cancelled = 3,
        Deleted = 4,
    }
}

define_status_enum! {
    /// Album file processing status.
    ///
    /// `Error` exists as a stored value but nothing in this codebase
    /// transitions into it; the upstream pipeline reports no failures yet.
    AlbumFileStatus {
        Active = 1,
        Inactive = 2,
        Deleted = 3,
        Processing = 4,
        Error = 5,
    }
}

define_status_enum! {
    /// Guest RSVP answer.
    RsvpStatus {
        Undecided = 0,
        Yes = 1,
        No = 2,
        Maybe = 3,
    }
}

define_status_enum! {
    /// Event (and account default) privacy.
    Privacy {
        Public = 1,
        Private = 2,
    }
}

define_status_enum! {
    /// Communication channel kind for validation rounds.
    CommChannelKind {
        Email = 0,
        Phone = 1,
    }
}

define_status_enum! {
    /// Background job status.
    JobStatus {
        Pending = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        assert_eq!(AccountStatus::from_id(-1), Some(AccountStatus::Contact));
        assert_eq!(AccountStatus::from_id(3), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::from_id(1), None);
        assert_eq!(
            AlbumFileStatus::from_id(AlbumFileStatus::Processing.id()),
            Some(AlbumFileStatus::Processing)
        );
        assert_eq!(EventStatus::Draft.id(), 1);
        assert_eq!(RsvpStatus::Undecided.id(), 0);
    }

    #[test]
    fn only_active_accounts_get_external_notifications() {
        assert!(AccountStatus::Active.receives_external_notifications());
        for status in [
            AccountStatus::Contact,
            AccountStatus::SignedUp,
            AccountStatus::Deleted,
            AccountStatus::DeactivatedForcefully,
        ] {
            assert!(!status.receives_external_notifications());
        }
    }
}
