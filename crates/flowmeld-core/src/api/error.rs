use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request could not be sent: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fields checked for a validation message, in the order they are reported.
const VALIDATION_FIELDS: [(&str, &str); 4] = [
    ("username", "Username"),
    ("email", "Email"),
    ("password", "Password"),
    ("detail", ""),
];

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// First field message of a validation error body, e.g.
    /// `{"username": ["A user with that username already exists."]}`.
    fn validation_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;

        VALIDATION_FIELDS.iter().find_map(|(field, label)| {
            let text = match object.get(*field)? {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            Some(if label.is_empty() {
                text
            } else {
                format!("{}: {}", label, text)
            })
        })
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => match Self::validation_message(body) {
                Some(message) => ApiError::Validation(message),
                None => ApiError::BadRequest(truncated),
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Message suitable for showing to the user in a form or status line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => {
                "Invalid username or password. Please try again.".to_string()
            }
            ApiError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            ApiError::Validation(message) => message.clone(),
            ApiError::RateLimited => self.to_string(),
            ApiError::NetworkError(_) | ApiError::Transport(_) => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
            other => format!("Request failed: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_status_mapping() {
        assert_matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized);
        assert_matches!(ApiError::from_status(StatusCode::FORBIDDEN, "no"), ApiError::AccessDenied(b) if b == "no");
        assert_matches!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), ApiError::RateLimited);
        assert_matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_));
        assert_matches!(ApiError::from_status(StatusCode::IM_A_TEAPOT, ""), ApiError::InvalidResponse(_));
    }

    #[test]
    fn test_validation_reports_first_field_in_order() {
        let body = r#"{"password": ["Ensure this field has at least 8 characters."],
                       "email": ["Enter a valid email address."]}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.user_message(), "Email: Enter a valid email address.");
    }

    #[test]
    fn test_validation_joins_multiple_messages() {
        let body = r#"{"username": ["This field is required.", "Too short."]}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.user_message(), "Username: This field is required., Too short.");
    }

    #[test]
    fn test_validation_detail_is_unlabelled() {
        let body = r#"{"detail": "No persona found for this user. Please create one first."}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.user_message(), "No persona found for this user. Please create one first.");
    }

    #[test]
    fn test_bad_request_without_known_fields_keeps_body() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"non_field_errors": ["plain text"]}"#);
        assert_matches!(err, ApiError::BadRequest(ref m) if m.contains("plain text"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let ApiError::ServerError(message) = err else {
            panic!("expected server error");
        };
        assert!(message.contains("truncated"));
        assert!(message.len() < body.len());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ApiError::InvalidCredentials.user_message(),
            "Invalid username or password. Please try again."
        );
        assert_eq!(
            ApiError::Transport("connection refused".into()).user_message(),
            "An unexpected error occurred. Please try again later."
        );
    }
}
