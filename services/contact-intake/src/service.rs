//! Intake Service
//!
//! Core orchestration for the contact-intake and auto-reply pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use juniper_utils::{validate_model, AppConfig, JuniperError, JuniperResult};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use validator::Validate;

use crate::composer::ReplyComposer;
use crate::dispatch::{EmailDispatcher, EmailMessage};
use crate::parser;
use crate::rate_limit::RateLimitStore;
use crate::templates::{html_paragraph, TemplateEngine, CONTACT_AUTO_REPLY, CONTACT_NOTIFICATION};

/// A validated contact-form submission. Exists only for the duration of
/// one request; nothing but the rate-limit marker outlives it.
#[derive(Debug, Clone, Validate)]
pub struct ContactSubmission {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub investment_goal: Option<String>,
    #[validate(length(min = 1))]
    pub message: String,
}

/// An email received by the monitored mailbox, delivered through the
/// forwarding webhook.
#[derive(Debug, Clone)]
pub struct InboundEmailEvent {
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Terminal outcome of the inbound-reply pipeline. The skip variants are
/// deliberate non-error outcomes, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Sent { email_id: String },
    RateLimited,
    Unparseable,
}

#[derive(Clone)]
pub struct IntakeService {
    config: Arc<AppConfig>,
    dispatcher: Arc<EmailDispatcher>,
    composer: Option<Arc<ReplyComposer>>,
    rate_limits: Arc<RateLimitStore>,
    templates: Arc<TemplateEngine>,
}

impl IntakeService {
    pub fn new(config: AppConfig) -> Self {
        let dispatcher = EmailDispatcher::from_config(&config);
        let composer = ReplyComposer::from_config(&config.completion).map(Arc::new);
        let rate_limits = RateLimitStore::new(&config.rate_limit);

        if !rate_limits.is_enabled() {
            warn!("no rate-limit store configured, duplicate suppression is disabled");
        }

        Self {
            dispatcher: Arc::new(dispatcher),
            composer,
            rate_limits: Arc::new(rate_limits),
            templates: Arc::new(TemplateEngine::new()),
            config: Arc::new(config),
        }
    }

    /// Bearer-token check for the inbound-reply webhook.
    pub fn authorize_webhook(&self, auth_header: Option<&str>) -> JuniperResult<()> {
        let secret = self
            .config
            .webhook
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| JuniperError::configuration("webhook secret is not configured"))?;

        let expected = format!("Bearer {}", secret);
        match auth_header {
            Some(header) if header == expected => Ok(()),
            _ => Err(JuniperError::authentication("Unauthorized")),
        }
    }

    /// Contact-form pipeline: validate, check credentials, check the
    /// cooldown marker, dispatch both emails jointly, then mark the
    /// cooldown window.
    pub async fn process_contact(&self, submission: ContactSubmission) -> JuniperResult<String> {
        validate_model(&submission)?;

        if !self.dispatcher.is_configured() {
            return Err(JuniperError::configuration(
                "no email provider credentials configured",
            ));
        }
        let business_address = self.business_address().ok_or_else(|| {
            JuniperError::configuration("business notification address is not configured")
        })?;

        let key = contact_rate_key(&submission.email);
        if !self.rate_limits.try_acquire(&key).await {
            info!(email = %submission.email, "contact submission suppressed by cooldown");
            return Err(JuniperError::rate_limit(
                "You can only send one message every 3 minutes. Please wait before trying again.",
            ));
        }

        let notification = self.build_notification(&submission, &business_address)?;
        let auto_reply = self.build_auto_reply(&submission)?;

        // Independent sends with independent outcomes; one failure must
        // not cancel or fail the other.
        let (notification_result, auto_reply_result) = tokio::join!(
            self.dispatcher.send(&notification),
            self.dispatcher.send_offloaded(&auto_reply),
        );

        match (&notification_result, &auto_reply_result) {
            (Err(_), Err(_)) => {
                error!(email = %submission.email, "both contact emails failed to dispatch");
                return Err(JuniperError::email_dispatch("all dispatch attempts failed"));
            }
            (Err(_), Ok(_)) => {
                warn!(email = %submission.email, "notification send failed, auto-reply delivered");
            }
            (Ok(_), Err(_)) => {
                warn!(email = %submission.email, "auto-reply send failed, notification delivered");
            }
            (Ok(_), Ok(_)) => {}
        }

        self.rate_limits
            .mark_used(&key, self.config.rate_limit.contact_cooldown_seconds)
            .await;

        Ok("Email sent successfully".to_string())
    }

    /// Inbound-reply pipeline: authorize (done by the handler), validate,
    /// check credentials, check the daily marker, re-derive the client
    /// address from notification copies, compose, dispatch, mark.
    pub async fn process_inbound_reply(
        &self,
        event: InboundEmailEvent,
    ) -> JuniperResult<ReplyOutcome> {
        let composer = self.composer.as_ref().ok_or_else(|| {
            JuniperError::configuration("completion-service token is not configured")
        })?;
        if !self.dispatcher.is_configured() {
            return Err(JuniperError::configuration(
                "no email provider credentials configured",
            ));
        }

        // Keyed by the wrapper sender and the UTC calendar date, checked
        // before parsing and marked after dispatch with the same key.
        // This is what keeps the monitored mailbox out of reply loops.
        let key = reply_rate_key(&event.from, chrono::Utc::now().date_naive());
        if !self.rate_limits.try_acquire(&key).await {
            info!(from = %event.from, "auto-reply suppressed by daily rate limit");
            return Ok(ReplyOutcome::RateLimited);
        }

        let (recipient, composer_body) = if parser::is_notification_copy(
            &event.from,
            &event.subject,
            self.notification_domain().as_deref(),
        ) {
            match parser::extract_client(&event.body) {
                Some(client) => {
                    info!(client = %client.email, "re-derived client address from notification copy");
                    let display = client.name.clone().unwrap_or_else(|| "Client".to_string());
                    let annotated = format!(
                        "[CONTEXT: This is a website contact form submission from {}]\n\nRAW MESSAGE: {}",
                        display, event.body
                    );
                    (client.email, annotated)
                }
                None => {
                    warn!(from = %event.from, "could not extract a client address from the notification body");
                    return Ok(ReplyOutcome::Unparseable);
                }
            }
        } else {
            (event.from.clone(), event.body.clone())
        };

        let draft = composer
            .compose(&recipient, &event.subject, &composer_body)
            .await
            .map_err(|e| {
                error!(error = %e, "reply composition failed");
                JuniperError::completion("completion service failed")
            })?;

        let message = EmailMessage {
            to: recipient.clone(),
            reply_to: None,
            subject: parser::reply_subject(&event.subject),
            html: draft,
            text: None,
        };
        let receipt = self.dispatcher.send_offloaded(&message).await?;

        self.rate_limits
            .mark_used(&key, self.config.rate_limit.reply_window_seconds)
            .await;

        info!(to = %recipient, id = %receipt.id, "auto-reply sent");
        Ok(ReplyOutcome::Sent { email_id: receipt.id })
    }

    pub async fn store_diagnostics(&self) -> JuniperResult<String> {
        self.rate_limits.diagnostics().await
    }

    fn business_address(&self) -> Option<String> {
        self.config.intake.business_address.clone().or_else(|| {
            self.config
                .smtp
                .as_ref()
                .map(|s| s.username.clone())
                .filter(|u| !u.is_empty())
        })
    }

    /// Domain the notification-copy heuristic matches against: where our
    /// own fallback channel sends from.
    fn notification_domain(&self) -> Option<String> {
        self.config
            .resend
            .as_ref()
            .and_then(|r| address_domain(&r.from_address))
    }

    fn build_notification(
        &self,
        submission: &ContactSubmission,
        business_address: &str,
    ) -> JuniperResult<EmailMessage> {
        let vars = notification_vars(submission);
        let rendered = self
            .templates
            .render(CONTACT_NOTIFICATION, &vars)
            .map_err(|e| JuniperError::internal(e.to_string()))?;

        Ok(EmailMessage {
            to: business_address.to_string(),
            reply_to: Some(submission.email.clone()),
            subject: rendered.subject,
            html: rendered.body_html,
            text: Some(rendered.body_text),
        })
    }

    fn build_auto_reply(&self, submission: &ContactSubmission) -> JuniperResult<EmailMessage> {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), json!(submission.name));
        vars.insert(
            "interest".to_string(),
            json!(interest_phrase(submission.investment_goal.as_deref())),
        );

        let rendered = self
            .templates
            .render(CONTACT_AUTO_REPLY, &vars)
            .map_err(|e| JuniperError::internal(e.to_string()))?;

        Ok(EmailMessage {
            to: submission.email.clone(),
            reply_to: None,
            subject: rendered.subject,
            html: rendered.body_html,
            text: Some(rendered.body_text),
        })
    }
}

/// Cooldown marker key for a form submitter, case-insensitive on the
/// address.
pub fn contact_rate_key(email: &str) -> String {
    format!("rate_limit_contact:{}", email.to_lowercase())
}

/// Daily suppression key for an inbound sender.
pub fn reply_rate_key(from: &str, date: NaiveDate) -> String {
    format!("rate_limit:{}:{}", from, date.format("%Y-%m-%d"))
}

fn interest_phrase(investment_goal: Option<&str>) -> String {
    match investment_goal {
        Some(goal) if !goal.trim().is_empty() => {
            format!("your interest in {}", goal.trim())
        }
        _ => "your investment goals".to_string(),
    }
}

fn address_domain(address: &str) -> Option<String> {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_string())
        .filter(|d| !d.is_empty())
}

fn notification_vars(submission: &ContactSubmission) -> HashMap<String, Value> {
    let mut vars = HashMap::new();
    vars.insert("name".to_string(), json!(submission.name));
    vars.insert("email".to_string(), json!(submission.email));
    vars.insert(
        "phone".to_string(),
        json!(submission.phone.as_deref().unwrap_or("Not provided")),
    );
    vars.insert(
        "investment_goal".to_string(),
        json!(submission
            .investment_goal
            .as_deref()
            .unwrap_or("Not specified")),
    );
    vars.insert("message".to_string(), json!(submission.message));
    vars.insert(
        "message_html".to_string(),
        json!(html_paragraph(&submission.message)),
    );
    vars
}
