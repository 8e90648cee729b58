//! API error classification.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::validate::FieldErrors;

/// Keys of a JSON error body that describe the error itself rather than a
/// form field.
const META_KEYS: &[&str] = &[
    "code", "message", "error", "field", "errors", "status", "timestamp", "path", "trace",
];

/// Phrases servers use for "value already taken" in plain-text bodies.
const DUPLICATE_PHRASES: &[&str] = &["already", "exists", "taken", "in use", "duplicate", "già"];

/// Fields a duplicate can refer to.
const DUPLICATE_FIELDS: &[&str] = &["username", "email"];

/// Errors returned by [`ApiClient`](super::ApiClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated. Log in first.")]
    NotAuthenticated,

    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Session expired or invalid: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{} already in use: {message}", .field.as_deref().unwrap_or("value"))]
    Duplicate {
        field: Option<String>,
        message: String,
    },

    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Could not reach the server: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = ErrorBody::parse(body);
        let message = parsed
            .as_ref()
            .and_then(ErrorBody::message)
            .map(str::to_string)
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED => return Self::Unauthorized(message),
            StatusCode::FORBIDDEN => return Self::Forbidden(message),
            StatusCode::NOT_FOUND => return Self::NotFound(message),
            _ => {}
        }

        match parsed {
            Some(body) => {
                if status == StatusCode::CONFLICT || body.is_duplicate() {
                    return Self::Duplicate {
                        field: body.duplicate_field(),
                        message,
                    };
                }
                if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY)
                    && !body.errors.is_empty()
                {
                    return Self::Validation(body.field_errors());
                }
            }
            None => {
                // Plain-text body: the only signal is the wording.
                if status == StatusCode::CONFLICT || mentions_duplicate(body) {
                    return Self::Duplicate {
                        field: mentioned_field(body),
                        message,
                    };
                }
            }
        }

        Self::Status { status, message }
    }

    /// HTTP status behind this error, when there was a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Messages that belong to specific form fields.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Duplicate {
                field: Some(field),
                message,
            } => {
                let mut errors = FieldErrors::default();
                errors.insert(field.clone(), message.clone());
                Some(errors)
            }
            _ => None,
        }
    }
}

/// Structured error body.
///
/// Accepts both an envelope (`{"code", "message", "field", "errors": {..}}`)
/// and a flat field-keyed object (`{"email": "Email already registered"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub field: Option<String>,
    pub errors: BTreeMap<String, String>,
}

impl ErrorBody {
    /// Parse a JSON object body. Anything else yields `None`.
    pub fn parse(body: &str) -> Option<Self> {
        let Value::Object(map) = serde_json::from_str::<Value>(body).ok()? else {
            return None;
        };

        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        let mut errors = BTreeMap::new();
        if let Some(Value::Object(nested)) = map.get("errors") {
            for (field, value) in nested {
                if let Some(message) = value.as_str() {
                    errors.insert(field.clone(), message.to_string());
                }
            }
        }
        for (key, value) in &map {
            if META_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(message) = value.as_str() {
                errors.insert(key.clone(), message.to_string());
            }
        }

        Some(Self {
            code: text("code"),
            message: text("message").or_else(|| text("error")),
            field: text("field"),
            errors,
        })
    }

    /// Best human-readable message.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.errors.values().next().map(String::as_str))
    }

    /// The server tagged this as a duplicate via its error code.
    pub fn is_duplicate(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| code.to_uppercase().contains("DUPLICATE"))
    }

    fn duplicate_field(&self) -> Option<String> {
        self.field
            .clone()
            .or_else(|| self.errors.keys().next().cloned())
            .or_else(|| self.message.as_deref().and_then(mentioned_field))
    }

    fn field_errors(&self) -> FieldErrors {
        self.errors
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn mentions_duplicate(text: &str) -> bool {
    let lower = text.to_lowercase();
    DUPLICATE_PHRASES.iter().any(|phrase| lower.contains(phrase))
        && mentioned_field(text).is_some()
}

fn mentioned_field(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    DUPLICATE_FIELDS
        .iter()
        .find(|field| lower.contains(*field))
        .map(|field| field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses() {
        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(msg) if msg == "Unauthorized"
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::FORBIDDEN, "nope"),
            ApiError::Forbidden(msg) if msg == "nope"
        ));
        assert_eq!(
            ApiError::from_response(StatusCode::FORBIDDEN, "").status(),
            Some(StatusCode::FORBIDDEN)
        );
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_typed_duplicate_code() {
        let body = r#"{"code": "DUPLICATE_EMAIL", "field": "email", "message": "Email already registered"}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);

        match &err {
            ApiError::Duplicate { field, message } => {
                assert_eq!(field.as_deref(), Some("email"));
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            err.field_errors().unwrap().get("email"),
            Some("Email already registered")
        );
    }

    #[test]
    fn test_conflict_with_flat_field_body() {
        let err = ApiError::from_response(StatusCode::CONFLICT, r#"{"username": "Username taken"}"#);
        assert!(matches!(
            err,
            ApiError::Duplicate { field: Some(ref f), .. } if f == "username"
        ));
    }

    #[test]
    fn test_validation_envelope() {
        let body = r#"{"message": "Validation failed", "errors": {"password": "too weak", "email": "bad"}}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);

        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("password"), Some("too weak"));
        assert_eq!(fields.get("email"), Some("bad"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_plain_text_duplicate_fallback() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, "Username already exists");
        assert!(matches!(
            err,
            ApiError::Duplicate { field: Some(ref f), .. } if f == "username"
        ));

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, "Something broke");
        assert!(matches!(
            err,
            ApiError::Status { status, .. } if status == StatusCode::BAD_REQUEST
        ));
    }

    #[test]
    fn test_spring_default_body_is_not_field_error() {
        let body = r#"{"timestamp": "2024-01-01T00:00:00", "status": 500, "error": "Internal Server Error", "path": "/api/books"}"#;
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, body);

        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "Internal Server Error"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_is_unstructured() {
        assert_eq!(ErrorBody::parse(r#"["a"]"#), None);
        assert_eq!(ErrorBody::parse("plain"), None);
    }
}
