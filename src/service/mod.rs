pub mod accounts;
pub mod permissions;
pub mod serializers;
pub mod validation;

pub use permissions::{check_object, is_safe_method, owner_or_read_only};
