//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use checkout::CheckoutSettings;

/// Client configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `API_BASE_URL`: backend root (default: `"http://localhost:5454"`)
/// - `PAYMENT_KEY_ID`: public key of the payment gateway account (default: empty)
/// - `PAYMENT_CURRENCY`: currency of gateway orders (default: `"INR"`)
/// - `MERCHANT_NAME`: name shown in the gateway widget (default: `"E-Learning Platform"`)
/// - `TOKEN_PATH`: where the session token is persisted (default: `".nebula/token"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub payment_key_id: String,
    pub payment_currency: String,
    pub merchant_name: String,
    pub token_path: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Loads `.env` if present, then reads the environment, falling back to defaults.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!(error = %e, "ignoring unreadable .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_base_url: var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            payment_key_id: var("PAYMENT_KEY_ID").unwrap_or(defaults.payment_key_id),
            payment_currency: var("PAYMENT_CURRENCY").unwrap_or(defaults.payment_currency),
            merchant_name: var("MERCHANT_NAME").unwrap_or(defaults.merchant_name),
            token_path: var("TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_path),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Gateway widget settings derived from this configuration.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            key_id: self.payment_key_id.clone(),
            currency: self.payment_currency.clone(),
            merchant_name: self.merchant_name.clone(),
            ..CheckoutSettings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5454".to_string(),
            payment_key_id: String::new(),
            payment_currency: "INR".to_string(),
            merchant_name: "E-Learning Platform".to_string(),
            token_path: PathBuf::from(".nebula/token"),
            log_level: "info".to_string(),
        }
    }
}
