use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub smtp: Option<SmtpConfig>,
    pub resend: Option<ResendConfig>,
    pub intake: IntakeConfig,
    pub completion: CompletionConfig,
    pub webhook: WebhookConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    pub timeout_seconds: u64,
}

/// Primary transactional channel (Zoho-style SMTP account).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

/// Fallback HTTP provider, also the source of the notification-domain heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResendConfig {
    pub api_key: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IntakeConfig {
    /// Business inbox for form notifications. Falls back to the SMTP
    /// username (send-to-self) when unset.
    pub business_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret expected in the Authorization header of
    /// inbound-reply webhook calls.
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Absent URL silently disables rate limiting.
    pub redis_url: Option<String>,
    pub connect_timeout_seconds: u64,
    pub contact_cooldown_seconds: u64,
    pub reply_window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with JUNIPER prefix
            .add_source(Environment::with_prefix("JUNIPER").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8087,
            max_request_size: 1024 * 1024, // 1MB
            timeout_seconds: 30,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.zoho.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_name: "Juniper Broz Investment Services".to_string(),
        }
    }
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_address: "myservice@resend.juniperbroz.com".to_string(),
            from_name: "Juniper Broz".to_string(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://models.inference.ai.azure.com/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout_seconds: 5,
            contact_cooldown_seconds: 180, // 3 minutes between form submissions
            reply_window_seconds: 86400,   // one auto-reply per sender per day
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}
