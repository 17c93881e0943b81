//! HTTP handlers for profiles, statuses, avatars and accounts.

pub mod accounts;
pub mod avatar;
pub mod profile;
pub mod status;
