use config::{Config, File};
use serde::Deserialize;

use crate::error::MixerError;

/// Env var holding the platform API key (`X-N8N-API-KEY`).
pub const PLATFORM_API_KEY_ENV: &str = "N8N_API_KEY";

/// Env var holding the gateway key sent as `X-API-KEY` on workflow creation.
pub const GATEWAY_API_KEY_ENV: &str = "ZYND_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct MixerConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub platform: PlatformConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    /// Upper bound for platform REST calls. Unset means no client-side timeout.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

/// A credential reference stored on the platform (id + display name).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CredentialConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TemplateConfig {
    pub agent_prefix: String,
    pub model: String,
    pub server_wallet_address: String,
    pub price: String,
    pub max_payment_usd: f64,
    pub execution_timeout_seconds: u64,
    pub openai_credential: CredentialConfig,
    pub zynd_credential: CredentialConfig,
    pub wallet_credential: CredentialConfig,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            agent_prefix: "zyndmixer".to_string(),
            model: "gpt-4.1-mini".to_string(),
            server_wallet_address: "0x212d1fBB46482FCC460A6BdB440dBAC718f51AC2".to_string(),
            price: "$0".to_string(),
            max_payment_usd: 0.3,
            execution_timeout_seconds: 3600,
            openai_credential: CredentialConfig {
                id: "EqoxoHGLtN9VgDEM".to_string(),
                name: "OpenAi account".to_string(),
            },
            zynd_credential: CredentialConfig {
                id: "E3AlIG9OQ969gewk".to_string(),
                name: "ZyndAI account".to_string(),
            },
            wallet_credential: CredentialConfig {
                id: "cOIJNOQkujh66aTy".to_string(),
                name: "Web3 Wallet Credentials account".to_string(),
            },
        }
    }
}

impl MixerConfig {
    pub fn load(path: &str) -> Result<Self, MixerError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Config pointing at `base_url` with every other section defaulted.
    pub fn for_platform(base_url: impl Into<String>) -> Self {
        Self {
            service: ServiceConfig {
                log_level: "info".to_string(),
            },
            http: HttpConfig::default(),
            platform: PlatformConfig {
                base_url: base_url.into(),
                request_timeout_seconds: None,
            },
            template: TemplateConfig::default(),
        }
    }
}
