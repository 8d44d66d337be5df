//! Input rules for request payloads. Each check records at most one message
//! per field; `finish` turns the collected messages into `AppError::Validation`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult, FieldError};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A field of a partial update: omitted, sent as `null`, or sent with a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// Only called after validation has rejected `Null`.
    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            Patch::Absent | Patch::Null => None,
        }
    }
}

/// Whether an empty value reads as "missing" (create) or "emptied" (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn empty(&mut self, field: &str, label: &str, presence: Presence) {
        match presence {
            Presence::Required => self.fail(field, format!("{label} is required")),
            Presence::Optional => self.fail(field, format!("{label} cannot be empty")),
        }
    }

    /// First and last names: 1..=100 characters after trimming.
    pub fn name(&mut self, field: &str, label: &str, value: &str, presence: Presence) {
        let len = value.chars().count();
        if len == 0 {
            self.empty(field, label, presence);
        } else if len > 100 {
            self.fail(field, format!("{label} must be between 1 and 100 characters"));
        }
    }

    pub fn username(&mut self, value: &str, presence: Presence) {
        let len = value.chars().count();
        if len == 0 {
            self.empty("username", "Username", presence);
        } else if !(3..=50).contains(&len) {
            self.fail("username", "Username must be between 3 and 50 characters");
        } else if !USERNAME_RE.is_match(value) {
            self.fail(
                "username",
                "Username can only contain letters, numbers, and underscores",
            );
        }
    }

    pub fn email(&mut self, value: &str, presence: Presence) {
        if value.is_empty() {
            self.empty("email", "Email", presence);
        } else if !is_valid_email(value) {
            self.fail("email", "Please provide a valid email address");
        }
    }

    /// Passwords are never trimmed.
    pub fn password(&mut self, value: &str, presence: Presence) {
        if value.is_empty() && presence == Presence::Required {
            self.fail("password", "Password is required");
        } else if value.chars().count() < 6 {
            self.fail("password", "Password must be at least 6 characters long");
        }
    }

    pub fn role(&mut self, value: &str) {
        if value != "basic" && value != "admin" {
            self.fail("role", r#"Role must be either "basic" or "admin""#);
        }
    }

    pub fn required(&mut self, field: &str, label: &str, value: &str) {
        if value.is_empty() {
            self.fail(field, format!("{label} is required"));
        }
    }

    /// Explicit `null` on an updatable field.
    pub fn null(&mut self, field: &str, label: &str) {
        self.fail(field, format!("{label} cannot be empty"));
    }

    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(checks: Checks) -> Vec<FieldError> {
        match checks.finish() {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("john@example.com"));
        assert!(!is_valid_email("john@"));
        assert!(!is_valid_email("john example@x.io"));
    }

    #[test]
    fn username_rules() {
        let mut c = Checks::new();
        c.username("ab", Presence::Required);
        c.username("john doe", Presence::Required);
        c.username("", Presence::Optional);
        let errors = messages(c);
        assert_eq!(
            errors[0].message,
            "Username must be between 3 and 50 characters"
        );
        assert_eq!(
            errors[1].message,
            "Username can only contain letters, numbers, and underscores"
        );
        assert_eq!(errors[2].message, "Username cannot be empty");

        let mut c = Checks::new();
        c.username("john_doe_42", Presence::Required);
        assert!(c.finish().is_ok());
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let mut c = Checks::new();
        c.name("firstName", "First name", "", Presence::Required);
        c.email("", Presence::Required);
        c.password("", Presence::Required);
        let errors = messages(c);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["firstName", "email", "password"]);
        assert_eq!(errors[0].message, "First name is required");
        assert_eq!(errors[2].message, "Password is required");
    }

    #[test]
    fn short_password_and_bad_role() {
        let mut c = Checks::new();
        c.password("12345", Presence::Optional);
        c.role("superuser");
        let errors = messages(c);
        assert_eq!(
            errors[0].message,
            "Password must be at least 6 characters long"
        );
        assert_eq!(errors[1].field, "role");
    }

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            a: Patch<String>,
            #[serde(default)]
            b: Patch<String>,
            #[serde(default)]
            c: Patch<String>,
        }
        let body: Body = serde_json::from_str(r#"{"b": null, "c": "x"}"#).unwrap();
        assert_eq!(body.a, Patch::Absent);
        assert_eq!(body.b, Patch::Null);
        assert_eq!(body.c, Patch::Value("x".to_string()));
    }
}
