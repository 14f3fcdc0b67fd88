//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub data_dir: PathBuf,
    pub content_api_base: String,
    pub recitation_edition: String,
    pub commentary_edition: String,
    pub genai_api_key: Option<String>,
    pub genai_api_base: String,
    pub genai_model: String,
    pub openai_api_key: Option<String>,
    pub sst_model: String,
    pub speech_language: String,
}

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_CONTENT_API_BASE: &str = "https://api.alquran.cloud/v1";
const DEFAULT_RECITATION_EDITION: &str = "ar.mahermuaiqly";
const DEFAULT_COMMENTARY_EDITION: &str = "ar.muyassar";
const DEFAULT_GENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_GENAI_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_SST_MODEL: &str = "whisper-1";
const DEFAULT_SPEECH_LANGUAGE: &str = "ar";

/// Built-in defaults with no credentials.
impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            content_api_base: DEFAULT_CONTENT_API_BASE.to_string(),
            recitation_edition: DEFAULT_RECITATION_EDITION.to_string(),
            commentary_edition: DEFAULT_COMMENTARY_EDITION.to_string(),
            genai_api_key: None,
            genai_api_base: DEFAULT_GENAI_API_BASE.to_string(),
            genai_model: DEFAULT_GENAI_MODEL.to_string(),
            openai_api_key: None,
            sst_model: DEFAULT_SST_MODEL.to_string(),
            speech_language: DEFAULT_SPEECH_LANGUAGE.to_string(),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Treats an empty variable the same as an unset one.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server settings ---
        let bind_address_str = var_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS);
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var_or("CORS_ORIGIN", DEFAULT_CORS_ORIGIN);
        let data_dir = PathBuf::from(var_or("DATA_DIR", DEFAULT_DATA_DIR));

        // --- Content API ---
        let content_api_base = var_or("CONTENT_API_BASE", DEFAULT_CONTENT_API_BASE);
        if !content_api_base.starts_with("http://") && !content_api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "CONTENT_API_BASE".to_string(),
                format!("'{}' is not an http(s) URL", content_api_base),
            ));
        }
        let recitation_edition = var_or("RECITATION_EDITION", DEFAULT_RECITATION_EDITION);
        let commentary_edition = var_or("COMMENTARY_EDITION", DEFAULT_COMMENTARY_EDITION);

        // --- API Keys (as optional) ---
        let genai_api_key = non_empty_var("GENAI_API_KEY").or_else(|| non_empty_var("API_KEY"));
        let openai_api_key = non_empty_var("OPENAI_API_KEY");

        // --- Adapter-specific settings ---
        let genai_api_base = var_or("GENAI_API_BASE", DEFAULT_GENAI_API_BASE);
        let genai_model = var_or("GENAI_MODEL", DEFAULT_GENAI_MODEL);
        let sst_model = var_or("SST_MODEL", DEFAULT_SST_MODEL);
        let speech_language = var_or("SPEECH_LANGUAGE", DEFAULT_SPEECH_LANGUAGE);

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            data_dir,
            content_api_base: content_api_base.trim_end_matches('/').to_string(),
            recitation_edition,
            commentary_edition,
            genai_api_key,
            genai_api_base,
            genai_model,
            openai_api_key,
            sst_model,
            speech_language,
        })
    }
}
