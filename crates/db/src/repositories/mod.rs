//! Table repositories.
//!
//! Stateless structs with associated async functions. Most take `&PgPool`;
//! functions that participate in a larger transaction take
//! `&mut PgConnection` so the caller owns the commit.

pub mod account_repo;
pub mod albumfile_repo;
pub mod comm_channel_repo;
pub mod event_repo;
pub mod guest_repo;
pub mod job_repo;
pub mod notification_repo;
pub mod password_reset_repo;
pub mod thumbnail_repo;

pub use account_repo::AccountRepo;
pub use albumfile_repo::AlbumFileRepo;
pub use comm_channel_repo::CommChannelRepo;
pub use event_repo::EventRepo;
pub use guest_repo::EventGuestRepo;
pub use job_repo::JobRepo;
pub use notification_repo::InAppNotificationRepo;
pub use password_reset_repo::PasswordResetRepo;
pub use thumbnail_repo::ThumbnailRepo;
