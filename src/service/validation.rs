//! Field-level validation of request bodies.

use crate::error::FieldErrors;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";

/// Rules for a text field. Lengths count characters, not bytes.
#[derive(Clone, Copy, Debug)]
pub struct TextRule {
    pub max_length: Option<usize>,
    pub required: bool,
    pub allow_blank: bool,
}

impl TextRule {
    pub const fn required(max_length: usize) -> Self {
        TextRule {
            max_length: Some(max_length),
            required: true,
            allow_blank: false,
        }
    }

    pub const fn optional(max_length: usize) -> Self {
        TextRule {
            max_length: Some(max_length),
            required: false,
            allow_blank: true,
        }
    }
}

/// Validate one text field from `body`, recording failures in `errors`.
/// Returns the trimmed value when present and valid. With `partial`, `required` is not enforced.
pub fn text_field(
    body: &HashMap<String, Value>,
    name: &str,
    rule: TextRule,
    partial: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = match body.get(name) {
        None => {
            if rule.required && !partial {
                errors.add(name, REQUIRED);
            }
            return None;
        }
        Some(Value::Null) => {
            errors.add(name, NULL);
            return None;
        }
        Some(v) => v,
    };
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            errors.add(name, NOT_A_STRING);
            return None;
        }
    };
    if text.is_empty() && !rule.allow_blank {
        errors.add(name, BLANK);
        return None;
    }
    if let Some(max) = rule.max_length {
        if text.chars().count() > max {
            errors.add(name, format!("Ensure this field has no more than {} characters.", max));
            return None;
        }
    }
    Some(text)
}

fn username_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").ok()).as_ref()
}

/// Usernames: letters, digits and `@ . + - _` only.
pub fn username_format(username: &str, errors: &mut FieldErrors) {
    if !username_pattern().is_some_and(|re| re.is_match(username)) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

/// Minimal email shape check: one `@` with a dotted domain after it.
pub fn email_format(email: &str, errors: &mut FieldErrors) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password strength rules applied at registration.
pub fn password_strength(field: &str, password: &str, username: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        );
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.add(field, "The password is too similar to the username.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => HashMap::new(),
        }
    }

    #[test]
    fn required_field_missing_unless_partial() {
        let b = body(json!({}));
        let mut errors = FieldErrors::new();
        assert_eq!(text_field(&b, "status", TextRule::required(240), false, &mut errors), None);
        assert_eq!(errors.get("status"), Some(&[REQUIRED.to_string()][..]));

        let mut errors = FieldErrors::new();
        text_field(&b, "status", TextRule::required(240), true, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn length_counts_characters() {
        let b = body(json!({ "city": "é".repeat(30) }));
        let mut errors = FieldErrors::new();
        assert!(text_field(&b, "city", TextRule::optional(30), false, &mut errors).is_some());
        assert!(errors.is_empty());

        let b = body(json!({ "city": "x".repeat(31) }));
        text_field(&b, "city", TextRule::optional(30), false, &mut errors);
        assert_eq!(
            errors.get("city"),
            Some(&["Ensure this field has no more than 30 characters.".to_string()][..])
        );
    }

    #[test]
    fn blank_and_null_handling() {
        let b = body(json!({ "status": "   ", "bio": "", "city": null }));
        let mut errors = FieldErrors::new();
        assert_eq!(text_field(&b, "status", TextRule::required(240), false, &mut errors), None);
        assert_eq!(text_field(&b, "bio", TextRule::optional(240), false, &mut errors), Some(String::new()));
        assert_eq!(text_field(&b, "city", TextRule::optional(30), false, &mut errors), None);
        assert_eq!(errors.get("status"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("city"), Some(&[NULL.to_string()][..]));
        assert!(errors.get("bio").is_none());
    }

    #[test]
    fn numbers_are_text_but_other_json_values_are_not() {
        let b = body(json!({ "city": 42, "bio": true, "status": ["a"] }));
        let mut errors = FieldErrors::new();
        assert_eq!(text_field(&b, "city", TextRule::optional(30), false, &mut errors), Some("42".into()));
        assert_eq!(text_field(&b, "bio", TextRule::optional(240), false, &mut errors), None);
        assert_eq!(text_field(&b, "status", TextRule::required(240), false, &mut errors), None);
        assert!(errors.get("city").is_none());
        assert_eq!(errors.get("bio"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(errors.get("status"), Some(&[NOT_A_STRING.to_string()][..]));
    }

    #[test]
    fn usernames_and_emails() {
        let mut errors = FieldErrors::new();
        username_format("test_case.1+x@y-z", &mut errors);
        email_format("test@test.com", &mut errors);
        assert!(errors.is_empty());

        username_format("bad name", &mut errors);
        email_format("nope", &mut errors);
        email_format("a@b", &mut errors);
        assert!(errors.get("username").is_some());
        assert_eq!(errors.get("email").map(|m| m.len()), Some(2));
    }

    #[test]
    fn weak_passwords_are_reported() {
        let mut errors = FieldErrors::new();
        password_strength("password1", "secret_password", "test_case", &mut errors);
        assert!(errors.is_empty());

        password_strength("password1", "1234", "bob", &mut errors);
        assert_eq!(errors.get("password1").map(|m| m.len()), Some(2));
    }
}
