//! HTTP Handlers
//!
//! Thin axum handlers mapping the JSON surface onto the intake service.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use juniper_utils::{require_field, ErrorResponse, JuniperError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::service::{ContactSubmission, InboundEmailEvent, IntakeService, ReplyOutcome};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: IntakeService,
}

/// Bridge from the error taxonomy to an HTTP response.
pub struct ApiError(pub JuniperError);

impl From<JuniperError> for ApiError {
    fn from(error: JuniperError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "contact-intake",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Contact-form request. All fields arrive optional so presence failures
/// surface as the contract's 400, not as a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "investmentGoal")]
    pub investment_goal: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

pub async fn contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    let submission = ContactSubmission {
        name: require_field("name", request.name.as_deref())?.to_string(),
        email: require_field("email", request.email.as_deref())?.to_string(),
        phone: request.phone,
        investment_goal: request.investment_goal,
        message: require_field("message", request.message.as_deref())?.to_string(),
    };

    let message = state.service.process_contact(submission).await?;

    Ok(Json(ContactResponse {
        success: true,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EmailReplyRequest {
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

pub async fn email_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EmailReplyRequest>,
) -> Result<Json<Value>, ApiError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|header| header.to_str().ok());
    state.service.authorize_webhook(auth_header)?;

    let event = InboundEmailEvent {
        from: require_field("from", request.from.as_deref())?.to_string(),
        subject: require_field("subject", request.subject.as_deref())?.to_string(),
        body: require_field("body", request.body.as_deref())?.to_string(),
    };

    let outcome = state.service.process_inbound_reply(event).await?;

    Ok(Json(reply_body(outcome)))
}

fn reply_body(outcome: ReplyOutcome) -> Value {
    match outcome {
        ReplyOutcome::Sent { email_id } => json!({
            "success": true,
            "emailId": email_id
        }),
        ReplyOutcome::RateLimited => json!({
            "skipped": true,
            "reason": "rate_limited"
        }),
        ReplyOutcome::Unparseable => json!({
            "success": false,
            "reason": "unparseable_contact_form_email"
        }),
    }
}

/// Store health check: SET/GET round-trip against the rate-limit store.
pub async fn diagnostics(State(state): State<AppState>) -> Response {
    match state.service.store_diagnostics().await {
        Ok(value) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Store connection working",
                "testValue": value
            })),
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": error.public_message()
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_taxonomy_statuses() {
        let response = ApiError(JuniperError::rate_limit("wait")).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = ApiError(JuniperError::validation("name", "missing")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(JuniperError::authentication("no")).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError(JuniperError::completion("down")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_reply_body_variants() {
        let sent = reply_body(ReplyOutcome::Sent {
            email_id: "re_123".to_string(),
        });
        assert_eq!(sent["success"], true);
        assert_eq!(sent["emailId"], "re_123");

        let skipped = reply_body(ReplyOutcome::RateLimited);
        assert_eq!(skipped["skipped"], true);
        assert_eq!(skipped["reason"], "rate_limited");

        let unparseable = reply_body(ReplyOutcome::Unparseable);
        assert_eq!(unparseable["success"], false);
        assert_eq!(unparseable["reason"], "unparseable_contact_form_email");
    }

    #[test]
    fn test_contact_request_accepts_camel_case_goal() {
        let request: ContactRequest = serde_json::from_str(
            r#"{"name":"Jane","email":"jane@x.com","investmentGoal":"crypto","message":"Hi"}"#,
        )
        .unwrap();
        assert_eq!(request.investment_goal.as_deref(), Some("crypto"));
    }
}
