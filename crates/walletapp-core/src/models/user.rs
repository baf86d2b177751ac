use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// The authenticated user as returned by `/auth/user/`.
/// Fields beyond these are kept in `extra` for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn display_name(&self) -> String {
        if self.email.is_empty() {
            self.username.clone()
        } else {
            format!("{} <{}>", self.username, self.email)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::InvalidInput(
                "Username and password required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sign-up payload. `password2` is the confirmation field the backend checks.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::InvalidInput("Username is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::InvalidInput("Email is required".to_string()));
        }
        if self.password != self.password2 {
            return Err(ApiError::InvalidInput(
                "Password fields didn't match.".to_string(),
            ));
        }
        Ok(())
    }
}
