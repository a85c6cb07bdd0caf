//! Email Dispatch
//!
//! Transactional sending through an ordered list of configured channels:
//! the SMTP account first, the Resend HTTP API as the fallback. The list
//! is fixed at construction from whichever credentials are present; each
//! message gets exactly one definitive outcome, with no cross-channel
//! retry.

use std::time::Duration;

use anyhow::{Context, Result};
use juniper_utils::{AppConfig, JuniperError, JuniperResult, ResendConfig, SmtpConfig};
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::{
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Outbound email, built and discarded per request. The sender identity
/// belongs to the channel that carries the message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Provider message identifier plus the channel that produced it.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub id: String,
    pub channel: &'static str,
}

pub enum EmailChannel {
    Smtp(SmtpChannel),
    Resend(ResendChannel),
}

impl EmailChannel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Resend(_) => "resend",
        }
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        match self {
            Self::Smtp(channel) => channel.send(message).await,
            Self::Resend(channel) => channel.send(message).await,
        }
    }
}

/// SMTP channel (the Zoho-style account). Sends as the authenticated
/// user, which the relay requires for the envelope to be accepted.
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.username)
                .parse()
                .context("Invalid from address")?;

        let to_mailbox: Mailbox = message.to.parse().context("Invalid to address")?;

        let mut builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(message.subject.as_str());

        if let Some(reply_to) = &message.reply_to {
            let reply_mailbox: Mailbox =
                reply_to.parse().context("Invalid reply-to address")?;
            builder = builder.reply_to(reply_mailbox);
        }

        let email = match &message.text {
            Some(text) => builder
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(text.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(message.html.clone()),
                        ),
                )
                .context("Failed to build email")?,
            None => builder
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html.clone()),
                )
                .context("Failed to build email")?,
        };

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .context("Failed to create SMTP transport")?
                .port(self.config.port)
                .credentials(creds)
                .build();

        let response = mailer.send(email).await.context("Failed to send email")?;

        Ok(SendReceipt {
            id: response.message().collect::<Vec<_>>().join(" "),
            channel: "smtp",
        })
    }
}

/// Resend HTTP channel.
pub struct ResendChannel {
    client: reqwest::Client,
    config: ResendConfig,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendChannel {
    pub fn new(config: ResendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        let request = ResendRequest {
            from: format!("{} <{}>", self.config.from_name, self.config.from_address),
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            reply_to: message.reply_to.as_deref(),
        };

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call Resend API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Resend API error: {} - {}",
                status,
                truncate(&error_text, 300)
            );
        }

        let result: ResendResponse = response
            .json()
            .await
            .context("Failed to parse Resend response")?;

        Ok(SendReceipt {
            id: result.id,
            channel: "resend",
        })
    }
}

/// Ordered channel list shared by both handlers.
pub struct EmailDispatcher {
    channels: Vec<EmailChannel>,
}

impl EmailDispatcher {
    /// Select channels from whichever credentials the configuration
    /// carries. SMTP leads when present; Resend follows as the fallback.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut channels = Vec::new();

        if let Some(smtp) = &config.smtp {
            if !smtp.username.is_empty() && !smtp.password.is_empty() {
                channels.push(EmailChannel::Smtp(SmtpChannel::new(smtp.clone())));
            }
        }

        if let Some(resend) = &config.resend {
            if !resend.api_key.is_empty() {
                channels.push(EmailChannel::Resend(ResendChannel::new(resend.clone())));
            }
        }

        Self { channels }
    }

    pub fn is_configured(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn has_smtp(&self) -> bool {
        self.channels
            .iter()
            .any(|c| matches!(c, EmailChannel::Smtp(_)))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(EmailChannel::name).collect()
    }

    /// Send through the primary channel.
    pub async fn send(&self, message: &EmailMessage) -> JuniperResult<SendReceipt> {
        let channel = self.channels.first().ok_or_else(|| {
            JuniperError::configuration("no email channel configured")
        })?;
        self.dispatch_via(channel, message).await
    }

    /// Send through the fallback channel when one is configured, keeping
    /// auto-replies off the primary provider's quota. Falls back to the
    /// only channel otherwise.
    pub async fn send_offloaded(&self, message: &EmailMessage) -> JuniperResult<SendReceipt> {
        let channel = self.channels.last().ok_or_else(|| {
            JuniperError::configuration("no email channel configured")
        })?;
        self.dispatch_via(channel, message).await
    }

    async fn dispatch_via(
        &self,
        channel: &EmailChannel,
        message: &EmailMessage,
    ) -> JuniperResult<SendReceipt> {
        match channel.send(message).await {
            Ok(receipt) => {
                info!(
                    channel = channel.name(),
                    to = %message.to,
                    id = %receipt.id,
                    "email dispatched"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(
                    channel = channel.name(),
                    to = %message.to,
                    error = %e,
                    "email dispatch failed"
                );
                Err(JuniperError::email_dispatch(format!(
                    "{} send failed",
                    channel.name()
                )))
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
