//! Registration, login and token issuance.

use crate::error::{AppError, FieldErrors};
use crate::models::{NewUser, User};
use crate::service::validation::{
    email_format, password_strength, text_field, username_format, TextRule, BLANK, NOT_A_STRING, REQUIRED,
};
use crate::store::Store;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde_json::Value;
use std::collections::HashMap;

const USERNAME: TextRule = TextRule::required(150);
const EMAIL: TextRule = TextRule::optional(254);
const MAX_PASSWORD_LENGTH: usize = 128;

pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing: {}", e)))
}

pub fn verify_password(hash: &str, plain: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// 40 lowercase hex characters.
pub fn generate_token_key() -> String {
    let mut key = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    key.truncate(40);
    key
}

/// Validate a registration body and create the user, their profile and their token.
/// Returns the new user and the token key.
pub async fn register(store: &dyn Store, body: &HashMap<String, Value>) -> Result<(User, String), AppError> {
    let mut errors = FieldErrors::new();
    let username = text_field(body, "username", USERNAME, false, &mut errors);
    let email = text_field(body, "email", EMAIL, false, &mut errors).unwrap_or_default();
    let password1 = raw_password(body, "password1", &mut errors);
    let password2 = raw_password(body, "password2", &mut errors);

    if let Some(username) = &username {
        username_format(username, &mut errors);
    }
    if !email.is_empty() {
        email_format(&email, &mut errors);
    }
    if let Some(p1) = &password1 {
        password_strength("password1", p1, username.as_deref().unwrap_or(""), &mut errors);
    }
    if let (Some(p1), Some(p2)) = (&password1, &password2) {
        if p1 != p2 {
            errors.add("non_field_errors", "The two password fields didn't match.");
        }
    }
    errors.into_result()?;

    let (Some(username), Some(password)) = (username, password1) else {
        return Err(AppError::Internal("registration fields missing after validation".into()));
    };
    let new_user = NewUser {
        username,
        email,
        password_hash: hash_password(&password)?,
    };
    let key = generate_token_key();
    let user = store.create_user(new_user, &key).await?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok((user, key))
}

/// Check credentials and return the user's token, issuing one if they have none.
pub async fn login(store: &dyn Store, body: &HashMap<String, Value>) -> Result<String, AppError> {
    let mut errors = FieldErrors::new();
    let username = text_field(body, "username", USERNAME, false, &mut errors);
    let password = raw_password(body, "password", &mut errors);
    errors.into_result()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Internal("login fields missing after validation".into()));
    };

    let user = store.user_by_username(&username).await?;
    let user = match user {
        Some(u) if verify_password(&u.password_hash, &password) => u,
        _ => {
            tracing::info!(username = %username, "failed login");
            return Err(AppError::field("non_field_errors", BAD_CREDENTIALS));
        }
    };
    store.get_or_create_token(user.id, &generate_token_key()).await
}

/// Passwords are taken verbatim (no trimming) but still must be non-empty strings.
fn raw_password(body: &HashMap<String, Value>, name: &str, errors: &mut FieldErrors) -> Option<String> {
    match body.get(name) {
        Some(Value::String(s)) if !s.is_empty() => {
            if s.chars().count() > MAX_PASSWORD_LENGTH {
                errors.add(
                    name,
                    format!("Ensure this field has no more than {} characters.", MAX_PASSWORD_LENGTH),
                );
                None
            } else {
                Some(s.clone())
            }
        }
        Some(Value::String(_)) => {
            errors.add(name, BLANK);
            None
        }
        Some(Value::Null) | None => {
            errors.add(name, REQUIRED);
            None
        }
        Some(_) => {
            errors.add(name, NOT_A_STRING);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => HashMap::new(),
        }
    }

    #[test]
    fn token_keys_are_40_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("secret_password").unwrap();
        assert!(verify_password(&hash, "secret_password"));
        assert!(!verify_password(&hash, "wrong"));
        assert!(!verify_password("not a hash", "secret_password"));
    }

    #[tokio::test]
    async fn register_then_login_returns_same_token() {
        let store = MemoryStore::new();
        let (user, key) = register(
            &store,
            &body(json!({
                "username": "testcase",
                "email": "test@test.com",
                "password1": "secret_password",
                "password2": "secret_password",
            })),
        )
        .await
        .unwrap();
        assert_eq!(user.username, "testcase");

        let login_key = login(&store, &body(json!({ "username": "testcase", "password": "secret_password" })))
            .await
            .unwrap();
        assert_eq!(login_key, key);

        let err = login(&store, &body(json!({ "username": "testcase", "password": "nope" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let store = MemoryStore::new();
        let err = register(
            &store,
            &body(json!({
                "username": "testcase",
                "password1": "secret_password",
                "password2": "other_password",
            })),
        )
        .await
        .unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.get("non_field_errors").is_some()),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(store.user_by_username("testcase").await.unwrap().is_none());
    }
}
