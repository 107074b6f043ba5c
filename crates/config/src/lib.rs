use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use carelink_captions::CaptionConfig;

/// HTTP/WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Credentials and endpoints for external speech/translation providers.
/// All optional: a missing key disables that provider and the pipeline
/// degrades per stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// Backing datastore for transcripts and the community lexicon. When no
/// base URL is configured the service runs with in-memory stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub providers: ProviderSettings,
    pub datastore: DatastoreSettings,
    pub pipeline: CaptionConfig,
}

impl Settings {
    /// Loads settings from `config/default.toml` (optional) layered with
    /// `CARELINK__`-prefixed environment variables, e.g.
    /// `CARELINK__SERVER__PORT=9000`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("CARELINK").separator("__"))
            .build()?
            .try_deserialize()
    }
}
