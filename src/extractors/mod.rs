//! Request extractors: caller identity and body fields.

pub mod auth;
pub mod body;

pub use auth::CurrentUser;
pub use body::{FieldMap, RawBody};
