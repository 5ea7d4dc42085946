//! # Configuration
//!
//! [`CheckoutConfig`] is read from a TOML file by [`ConfigLoader`]:
//!
//! 1. `${VAR}` placeholders in the file are replaced with environment values.
//! 2. The TOML is parsed; missing sections fall back to [`Default`].
//! 3. `CHECKOUT_`-prefixed environment variables override a few fields
//!    (`CLIENT_KEY`, `ENVIRONMENT`, `BASE_URL`).
//! 4. The result is validated.
//!
//! ```toml
//! [checkout]
//! default_country = "US"
//! default_payment_method = "AdyenComponent"
//! tokenized_methods = ["AdyenComponent", "CREDIT_CARD"]
//!
//! [widget]
//! client_key = "${ADYEN_CLIENT_KEY}"
//! environment = "test"
//!
//! [services]
//! base_url = "https://shop.example.com/on/demandware.store/Sites-Site"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub checkout: CheckoutSettings,
    pub widget: WidgetConfig,
    pub services: ServiceConfig,
}

/// Core orchestration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutSettings {
    /// Country of the empty billing address used when nothing else is known.
    pub default_country: String,
    /// Region of that empty address.
    pub default_state_code: String,
    /// Payment method selected before the directory has loaded.
    pub default_payment_method: String,
    /// Methods treated as tokenized while no directory snapshot says otherwise.
    pub tokenized_methods: Vec<String>,
    /// Capacity of the checkout actor's command channel.
    pub channel_capacity: usize,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            default_country: "US".to_string(),
            default_state_code: "AL".to_string(),
            default_payment_method: "AdyenComponent".to_string(),
            tokenized_methods: vec!["AdyenComponent".to_string(), "CREDIT_CARD".to_string()],
            channel_capacity: 32,
        }
    }
}

/// Settings handed to the tokenization widget at mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub client_key: String,
    pub environment: String,
    pub locale: String,
    pub country_code: String,
    pub allowed_brands: Vec<String>,
    pub show_pay_button: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            client_key: String::new(),
            environment: "test".to_string(),
            locale: "en-US".to_string(),
            country_code: "US".to_string(),
            allowed_brands: vec!["visa".to_string(), "mc".to_string()],
            show_pay_button: false,
        }
    }
}

/// Endpoints used by the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub save_address_path: String,
    pub payment_methods_path: String,
    pub submit_payment_path: String,
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            save_address_path: "/Address-SaveAddress".to_string(),
            payment_methods_path: "/Adyen-GetPaymentMethods".to_string(),
            submit_payment_path: "/CheckoutServices-SubmitPayment".to_string(),
            timeout_ms: 15_000,
        }
    }
}

impl CheckoutSettings {
    /// Classification used while the directory cannot answer.
    pub fn is_tokenized_by_default(&self, method: &str) -> bool {
        self.tokenized_methods.iter().any(|m| m == method)
    }
}

/// Configuration loader with environment variable substitution
#[derive(Debug)]
pub struct ConfigLoader {
    file_path: Option<String>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file_path: None,
            env_prefix: "CHECKOUT_".to_string(),
        }
    }

    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub async fn load(&self) -> Result<CheckoutConfig, ConfigError> {
        let Some(file_path) = &self.file_path else {
            return Err(ConfigError::FileNotFound(
                "No configuration file specified".to_string(),
            ));
        };

        if !Path::new(file_path).exists() {
            return Err(ConfigError::FileNotFound(file_path.clone()));
        }

        let content = tokio::fs::read_to_string(file_path).await?;
        self.load_from_str(&content)
    }

    /// Runs substitution, parsing, overrides and validation on in-memory TOML.
    pub fn load_from_str(&self, content: &str) -> Result<CheckoutConfig, ConfigError> {
        let substituted = self.substitute_env_vars(content)?;

        let mut config: CheckoutConfig =
            toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        self.apply_env_overrides(&mut config);
        self.validate_config(&config)?;

        Ok(config)
    }

    fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];

            let env_value =
                env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

            result = result.replace(full_match, &env_value);
        }

        Ok(result)
    }

    fn apply_env_overrides(&self, config: &mut CheckoutConfig) {
        if let Ok(client_key) = env::var(format!("{}CLIENT_KEY", self.env_prefix)) {
            config.widget.client_key = client_key;
        }

        if let Ok(environment) = env::var(format!("{}ENVIRONMENT", self.env_prefix)) {
            config.widget.environment = environment;
        }

        if let Ok(base_url) = env::var(format!("{}BASE_URL", self.env_prefix)) {
            config.services.base_url = base_url;
        }
    }

    fn validate_config(&self, config: &CheckoutConfig) -> Result<(), ConfigError> {
        let checkout = &config.checkout;

        if checkout.default_country.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "checkout.default_country must not be empty".to_string(),
            ));
        }

        if checkout.default_payment_method.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "checkout.default_payment_method must not be empty".to_string(),
            ));
        }

        if checkout.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "checkout.channel_capacity must be at least 1".to_string(),
            ));
        }

        if config.services.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "services.timeout_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = ConfigLoader::new()
            .with_env_prefix("CHECKOUT_TEST_EMPTY_")
            .load_from_str("")
            .unwrap();
        assert_eq!(config, CheckoutConfig::default());
        assert!(config.checkout.is_tokenized_by_default("CREDIT_CARD"));
        assert!(!config.checkout.is_tokenized_by_default("GIFT_CERTIFICATE"));
    }

    #[test]
    fn test_placeholders_and_overrides() {
        env::set_var("CHECKOUT_TEST_SUBST_KEY", "test_ABC123");
        env::set_var("CHECKOUT_TEST_OVR_BASE_URL", "https://override.example.com");

        let toml = r#"
            [widget]
            client_key = "${CHECKOUT_TEST_SUBST_KEY}"
            locale = "de-DE"

            [services]
            base_url = "https://file.example.com"
        "#;
        let config = ConfigLoader::new()
            .with_env_prefix("CHECKOUT_TEST_OVR_")
            .load_from_str(toml)
            .unwrap();

        assert_eq!(config.widget.client_key, "test_ABC123");
        assert_eq!(config.widget.locale, "de-DE");
        assert_eq!(config.widget.allowed_brands, vec!["visa", "mc"]);
        assert_eq!(config.services.base_url, "https://override.example.com");
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let result = ConfigLoader::new()
            .load_from_str("[widget]\nclient_key = \"${CHECKOUT_TEST_DEFINITELY_UNSET}\"\n");
        assert!(matches!(result, Err(ConfigError::EnvVarNotFound(name)) if name == "CHECKOUT_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = ConfigLoader::new()
            .with_env_prefix("CHECKOUT_TEST_CAP_")
            .load_from_str("[checkout]\nchannel_capacity = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[checkout]\ndefault_country = \"CA\"\ndefault_state_code = \"ON\"").unwrap();

        let config = ConfigLoader::new()
            .with_env_prefix("CHECKOUT_TEST_FILE_")
            .with_file(file.path())
            .load()
            .await
            .unwrap();

        assert_eq!(config.checkout.default_country, "CA");
        assert_eq!(config.checkout.default_state_code, "ON");
        assert_eq!(config.checkout.default_payment_method, "AdyenComponent");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/checkout.toml")
            .load()
            .await;
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
