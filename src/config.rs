use crate::error::{RelayError, Result};
use crate::prompt::TemplateFit;
use std::env;
use std::fmt;

pub const API_KEY_VAR: &str = "AI_GATEWAY_API_KEY";
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            api_key: None,
            url: DEFAULT_GATEWAY_URL.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GatewayConfig {
            api_key: env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty()),
            url: env::var("AI_GATEWAY_URL").unwrap_or(defaults.url),
            model: env::var("IMAGE_MODEL").unwrap_or(defaults.model),
            timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RelayError::MissingCredential(API_KEY_VAR.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub allowed_origin: String,
    pub max_body_mb: usize,
    pub json_logs: bool,
    pub template_fit: TemplateFit,
    pub require_template: bool,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: None,
            allowed_origin: "*".to_string(),
            max_body_mb: 25,
            json_logs: false,
            template_fit: TemplateFit::Strict,
            require_template: false,
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let template_fit = match env::var("TEMPLATE_FIT") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.template_fit,
        };
        let require_template = env::var("REQUIRE_TEMPLATE")
            .ok()
            .map_or(false, |val| val == "true");
        let json_logs = env::var("LOG_FORMAT")
            .ok()
            .map_or(false, |val| val.eq_ignore_ascii_case("json"));

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            allowed_origin: env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            max_body_mb: env::var("MAX_BODY_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_mb),
            json_logs,
            template_fit,
            require_template,
            gateway: GatewayConfig::from_env(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8080)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    pub fn with_template_fit(mut self, fit: TemplateFit) -> Self {
        self.template_fit = fit;
        self
    }

    pub fn with_required_template(mut self, required: bool) -> Self {
        self.require_template = required;
        self
    }

    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}
