//! Reply Composer
//!
//! Drafts reply bodies through a chat-completion endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use juniper_utils::CompletionConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct ReplyComposer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ReplyComposer {
    /// Returns `None` when no completion-service token is configured.
    pub fn from_config(config: &CompletionConfig) -> Option<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Draft an HTML reply to the given client email. Fails on a
    /// non-success upstream status and on an empty completion; the caller
    /// must not send anything in either case.
    pub async fn compose(&self, sender: &str, subject: &str, body: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: REPLY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Generate a professional reply to this client email:\n\nClient: {}\nSubject: {}\n\nContent: {}",
                        sender, subject, body
                    ),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(sender = %sender, model = %self.model, "requesting reply draft");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call completion API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let truncated: String = error_text.chars().take(300).collect();
            anyhow::bail!("Completion API error: {} - {}", status, truncated);
        }

        let result: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        let draft = result
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .filter(|c| !c.is_empty())
            .context("Completion returned no content")?;

        Ok(draft.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const REPLY_SYSTEM_PROMPT: &str = r#"You are a professional email assistant for Juniper Broz Investment Services.
Write polite, clear, and concise email replies.
- Tone: Professional, warm, and helpful.
- Sign off: "Juniper Broz Investment Services".
- Format: Clean HTML paragraphs.
- If it's a contact form summary, address the user's specific questions mentioned in the text."#;
