use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum JuniperError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Email dispatch error: {message}")]
    EmailDispatch { message: String },

    #[error("Completion service error: {message}")]
    Completion { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl JuniperError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn email_dispatch(message: impl Into<String>) -> Self {
        Self::EmailDispatch {
            message: message.into(),
        }
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
        }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::EmailDispatch { .. } => "EMAIL_DISPATCH_ERROR",
            Self::Completion { .. } => "COMPLETION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Authentication { .. } => 401,
            Self::Configuration { .. } => 500,
            Self::EmailDispatch { .. } => 502,
            Self::Completion { .. } => 502,
            Self::ExternalService { .. } => 502,
            Self::RateLimit { .. } => 429,
            Self::Internal { .. } => 500,
        }
    }

    /// Body shown to the caller. Configuration and internal details stay
    /// in the server-side logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration { .. } => "Server configuration error".to_string(),
            Self::Internal { .. } => "Internal server error".to_string(),
            Self::EmailDispatch { .. } => "Email sending failed".to_string(),
            Self::Completion { .. } => "AI service unreachable".to_string(),
            Self::ExternalService { service, .. } => {
                format!("Upstream service unavailable: {}", service)
            }
            other => other.to_string(),
        }
    }
}

pub type JuniperResult<T> = Result<T, JuniperError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl From<JuniperError> for ErrorResponse {
    fn from(error: JuniperError) -> Self {
        Self {
            error: error.public_message(),
            code: error.error_code().to_string(),
            message: error.public_message(),
        }
    }
}

// Conversion from common error types
impl From<redis::RedisError> for JuniperError {
    fn from(error: redis::RedisError) -> Self {
        Self::external_service("Redis", error.to_string())
    }
}

impl From<reqwest::Error> for JuniperError {
    fn from(error: reqwest::Error) -> Self {
        Self::external_service("HTTP Client", error.to_string())
    }
}

impl From<serde_json::Error> for JuniperError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(JuniperError::validation("name", "missing").http_status_code(), 400);
        assert_eq!(JuniperError::authentication("bad token").http_status_code(), 401);
        assert_eq!(JuniperError::rate_limit("wait").http_status_code(), 429);
        assert_eq!(JuniperError::configuration("no creds").http_status_code(), 500);
        assert_eq!(JuniperError::email_dispatch("both failed").http_status_code(), 502);
        assert_eq!(JuniperError::completion("empty reply").http_status_code(), 502);
    }

    #[test]
    fn test_configuration_details_are_not_echoed() {
        let error = JuniperError::configuration("SMTP_PASSWORD missing from environment");
        let response = ErrorResponse::from(error);
        assert_eq!(response.error, "Server configuration error");
        assert!(!response.message.contains("SMTP_PASSWORD"));
    }

    #[test]
    fn test_rate_limit_message_is_echoed() {
        let error = JuniperError::rate_limit("Please wait 3 minutes");
        let response = ErrorResponse::from(error);
        assert!(response.error.contains("3 minutes"));
    }
}
