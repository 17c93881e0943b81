//! Write-own, read-any permission checks shared by profiles and statuses.

use crate::error::AppError;
use crate::models::{Owned, User, UserId};
use axum::http::Method;

/// GET, HEAD and OPTIONS never change state.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Safe methods are always allowed; anything else only for the owner.
pub fn owner_or_read_only(method: &Method, requester: UserId, owner: UserId) -> bool {
    is_safe_method(method) || requester == owner
}

/// Object-level check run after the record is loaded. Profiles and statuses both go through here.
pub fn check_object<T: Owned>(method: &Method, requester: &User, object: &T) -> Result<(), AppError> {
    if owner_or_read_only(method, requester.id, object.owner_id()) {
        Ok(())
    } else {
        tracing::info!(
            user_id = requester.id,
            owner_id = object.owner_id(),
            method = %method,
            "write denied to non-owner"
        );
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileStatus;
    use chrono::Utc;

    fn user(id: UserId) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        }
    }

    fn status_owned_by(owner: UserId) -> ProfileStatus {
        ProfileStatus {
            id: 1,
            user_id: owner,
            username: format!("user{}", owner),
            status: "hi".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn safe_methods_are_always_allowed() {
        for m in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(owner_or_read_only(&m, 1, 2));
        }
    }

    #[test]
    fn unsafe_methods_need_ownership() {
        for m in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(owner_or_read_only(&m, 3, 3));
            assert!(!owner_or_read_only(&m, 3, 4));
        }
    }

    #[test]
    fn object_check_maps_denial_to_forbidden() {
        let status = status_owned_by(1);
        assert!(check_object(&Method::PUT, &user(1), &status).is_ok());
        assert!(check_object(&Method::GET, &user(2), &status).is_ok());
        assert!(matches!(check_object(&Method::DELETE, &user(2), &status), Err(AppError::Forbidden)));
    }
}
