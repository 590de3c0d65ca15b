//! Error types and handling for the Air Quality Meter skill

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the skill backend
#[derive(Error, Debug)]
pub enum SkillError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request came from an application this skill is not registered for
    #[error("Invalid application: {message}")]
    InvalidApplication { message: String },

    /// Request envelope could not be handled
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl SkillError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid application error
    pub fn invalid_application<S: Into<String>>(message: S) -> Self {
        Self::InvalidApplication {
            message: message.into(),
        }
    }

    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkillError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            SkillError::InvalidApplication { .. } => {
                "This request was not issued for the Air Quality Meter skill.".to_string()
            }
            SkillError::InvalidRequest { message } => format!("Invalid request: {message}"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SkillError::InvalidApplication { .. } | SkillError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            SkillError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SkillError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Skill request failed");
        } else {
            tracing::warn!(error = %self, "Rejected skill request");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

/// Outcome of a failed air quality lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Provider answered with a status other than 200
    #[error("Location not supported by provider (HTTP {status})")]
    UnsupportedLocation { status: u16 },

    /// Provider reported that no data is available for the location
    #[error("No air quality data for location")]
    LocationNotFound,

    /// Connection-level failure while talking to the provider
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl QueryError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL so the provider key never ends up in logs.
        QueryError::transport(err.without_url().to_string())
    }
}
