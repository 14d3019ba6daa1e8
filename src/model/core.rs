//! Shared pieces of the data layer: the service error type, validation regexes and small response objects.

use custom_error::custom_error;
use itertools::Itertools;
use lazy_static::lazy_static;
use poem_openapi::Object;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

pub const USERNAME_MIN_LENGTH: u64 = 3;
pub const USERNAME_MAX_LENGTH: u64 = 64;
pub const PASSWORD_MIN_LENGTH: u64 = 6;
pub const DEFAULT_MAX_LENGTH: u64 = 255;
pub const DEFAULT_MIN_LENGTH: u64 = 1;
pub const TICKET_NAME_MAX_LENGTH: u64 = 100;

lazy_static! {
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    // Anything outside this set is replaced in stored file names.
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_.\-]").unwrap();
}

custom_error! { pub ServiceError
    NotFound{what: String} = "{what} not found",
    Conflict{msg: String} = "{msg}",
    Invalid{msg: String} = "{msg}",
    Forbidden{msg: String} = "{msg}",
}

impl ServiceError {
    pub fn not_found(what: &str) -> anyhow::Error {
        ServiceError::NotFound {
            what: what.to_string(),
        }
        .into()
    }

    pub fn conflict(msg: &str) -> anyhow::Error {
        ServiceError::Conflict {
            msg: msg.to_string(),
        }
        .into()
    }

    pub fn invalid(msg: &str) -> anyhow::Error {
        ServiceError::Invalid {
            msg: msg.to_string(),
        }
        .into()
    }

    pub fn forbidden(msg: &str) -> anyhow::Error {
        ServiceError::Forbidden {
            msg: msg.to_string(),
        }
        .into()
    }
}

/// Flatten validator errors into one readable line, e.g. `username: too short; email: invalid`.
pub fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .sorted_by_key(|(field, _)| field.to_string())
        .map(|(field, errs)| {
            let msgs = errs
                .iter()
                .map(|e| match &e.message {
                    Some(m) => m.to_string(),
                    None => e.code.to_string(),
                })
                .join(", ");
            format!("{}: {}", field, msgs)
        })
        .join("; ")
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Treat blank optional strings as missing.
pub fn non_blank(value: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Message {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        username: String,
        #[validate(regex(path = "EMAIL_REGEX", message = "invalid"))]
        email: String,
    }

    #[test]
    fn test_validation_message() {
        let sample = Sample {
            username: "ab".to_string(),
            email: "nope".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "email: invalid; username: too short"
        );
    }

    #[test]
    fn test_email_regex() {
        assert!(is_valid_email("info@gastronomirun.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(!is_valid_email("info@gastronomirun"));
        assert!(!is_valid_email("no at sign.com"));
    }

    #[test]
    fn test_service_error_downcast() {
        let err = ServiceError::not_found("Class 3");
        assert_eq!(err.to_string(), "Class 3 not found");
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
