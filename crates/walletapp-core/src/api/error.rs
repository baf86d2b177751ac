use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(serde_json::Value),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

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

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 | 422 => match serde_json::from_str::<serde_json::Value>(body) {
                Ok(payload) => ApiError::Validation(payload),
                Err(_) => ApiError::Validation(serde_json::Value::String(Self::truncate_body(body))),
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(Self::truncate_body(body)),
            404 => ApiError::NotFound(Self::truncate_body(body)),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, Self::truncate_body(body))),
        }
    }

    /// True for failures that mean the user has to authenticate again
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::SessionExpired)
    }

    /// Message suitable for showing to the user in a form or list view.
    ///
    /// Validation payloads are surfaced verbatim; server-side failures are
    /// collapsed into a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(payload) => Self::flatten_validation(payload),
            ApiError::InvalidCredentials => {
                "Invalid username or password. Please try again.".to_string()
            }
            ApiError::Unauthorized => "Not authorized. Please log in again.".to_string(),
            ApiError::SessionExpired => "Session expired. Please log in again.".to_string(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::ServerError(_) | ApiError::InvalidResponse(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Render a field-error payload such as `{"password": ["Too short."]}`
    /// as `password: Too short.` lines.
    fn flatten_validation(payload: &serde_json::Value) -> String {
        use serde_json::Value;

        fn text(value: &Value) -> String {
            match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join(" "),
                other => other.to_string(),
            }
        }

        match payload {
            Value::Object(fields) => fields
                .iter()
                .map(|(field, messages)| {
                    if field == "detail" || field == "non_field_errors" || field == "error" {
                        text(messages)
                    } else {
                        format!("{}: {}", field, text(messages))
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => text(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_taxonomy() {
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(403, "no"), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(429, ""), ApiError::RateLimited));
        assert!(matches!(ApiError::from_status(502, "bad gateway"), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(418, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_validation_payload_kept_verbatim() {
        let err = ApiError::from_status(400, r#"{"password": ["Password fields didn't match."]}"#);
        match &err {
            ApiError::Validation(payload) => {
                assert_eq!(payload["password"][0], "Password fields didn't match.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), "password: Password fields didn't match.");
    }

    #[test]
    fn test_validation_non_json_body() {
        let err = ApiError::from_status(400, "plain text");
        assert_eq!(err.user_message(), "plain text");
    }

    #[test]
    fn test_detail_field_has_no_prefix() {
        let err = ApiError::from_status(400, r#"{"detail": "No active account found"}"#);
        assert_eq!(err.user_message(), "No active account found");
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(
            ApiError::InvalidCredentials.user_message(),
            "Invalid username or password. Please try again."
        );
        assert_eq!(ApiError::Unauthorized.user_message(), "Not authorized. Please log in again.");
        assert!(ApiError::Unauthorized.is_auth_failure());
        assert!(!ApiError::InvalidCredentials.is_auth_failure());
    }

    #[test]
    fn test_server_error_is_generic() {
        let err = ApiError::from_status(500, "Traceback (most recent call last)");
        assert_eq!(err.user_message(), "Something went wrong. Please try again later.");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated, 520 total bytes"));
    }
}
