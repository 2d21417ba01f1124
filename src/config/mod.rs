//! Configuration module for the TubeBrief service

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub quota: QuotaSettings,
    pub gemini: GeminiSettings,
    pub transcript: TranscriptSettings,
    pub payment: PaymentSettings,
    pub cors: CorsSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Database configuration for PostgreSQL
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Sliding-window quota for the AI endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    pub max_requests: i64,
    pub window_secs: u64,
    /// Pro key that bypasses the quota when presented. Unset disables the
    /// bypass path entirely.
    pub pro_key: Option<String>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    /// Models tried in order after `model` fails.
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

/// Transcript retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSettings {
    /// Caption languages tried in order.
    pub languages: Vec<String>,
    /// Last-resort language when every preferred one fails.
    pub default_language: String,
    /// Optional HTTP proxy for caption requests.
    pub proxy_url: Option<String>,
}

/// Mercado Pago checkout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    pub access_token: Option<String>,
    pub product_title: String,
    pub product_price: f64,
    pub currency: String,
}

/// Cross-origin configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins; a single "*" allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with TUBEBRIEF_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("TUBEBRIEF")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("transcript.languages")
                    .with_list_parse_key("gemini.fallback_models")
                    .with_list_parse_key("cors.allowed_origins"),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations that cannot produce a working guard.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.quota.max_requests <= 0 {
            return Err(ConfigError::Message(
                "quota.max_requests must be positive".to_string(),
            ));
        }
        if self.quota.window_secs == 0 {
            return Err(ConfigError::Message(
                "quota.window_secs must be positive".to_string(),
            ));
        }
        if self.transcript.default_language.is_empty() {
            return Err(ConfigError::Message(
                "transcript.default_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
            },
            database: DatabaseSettings {
                url: String::new(),
                max_connections: Some(10),
            },
            quota: QuotaSettings {
                max_requests: 5,
                window_secs: 3600,
                pro_key: None,
            },
            gemini: GeminiSettings {
                api_key: String::new(),
                model: "gemini-2.5-flash".to_string(),
                fallback_models: Vec::new(),
            },
            transcript: TranscriptSettings {
                languages: vec![
                    "pt".to_string(),
                    "en".to_string(),
                    "pt-BR".to_string(),
                    "en-US".to_string(),
                ],
                default_language: "en".to_string(),
                proxy_url: None,
            },
            payment: PaymentSettings {
                access_token: None,
                product_title: "TubeBrief Pro".to_string(),
                product_price: 9.90,
                currency: "BRL".to_string(),
            },
            cors: CorsSettings {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quota_matches_policy() {
        let settings = Settings::default();
        assert_eq!(settings.quota.max_requests, 5);
        assert_eq!(settings.quota.window_secs, 3600);
        assert!(settings.quota.pro_key.is_none());
    }

    #[test]
    fn default_language_chain_prefers_portuguese() {
        let settings = Settings::default();
        assert_eq!(settings.transcript.languages[0], "pt");
        assert_eq!(settings.transcript.default_language, "en");
    }
}
