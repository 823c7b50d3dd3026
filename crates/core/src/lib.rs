//! Shared vocabulary for the fête backend.
//!
//! This crate holds the types every other crate speaks:
//!
//! - [`types`] — database id and timestamp aliases.
//! - [`error`] — the domain-level [`CoreError`](error::CoreError).
//! - [`notification`] — the notification type enumeration, the tagged
//!   [`SubjectRef`](notification::SubjectRef) union, and the in-memory
//!   [`NotificationIntent`](notification::NotificationIntent).
//! - [`normalize`] — email and E.164 phone normalization.

pub mod error;
pub mod normalize;
pub mod notification;
pub mod types;

pub use error::CoreError;
pub use notification::{NotificationIntent, NotificationType, SubjectRef};
pub use types::{DbId, Timestamp};
