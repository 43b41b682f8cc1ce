//! Process configuration from the environment

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_SYMPTOMS_PATH: &str = "config/symptoms_config.json";
const DEFAULT_FACILITIES_PATH: &str = "config/facilities.json";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    /// Local Bot API server instead of api.telegram.org
    pub telegram_base_url: Option<String>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,
    pub symptoms_path: PathBuf,
    pub facilities_path: PathBuf,
    /// Upper bound on a single model call
    pub ai_timeout: Duration,
    /// Long-poll window for `getUpdates`
    pub poll_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        // Blank values count as unset
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(SettingsError::Missing(name));
        let seconds = |name: &'static str, default: u64| -> Result<Duration, SettingsError> {
            match get(name) {
                None => Ok(Duration::from_secs(default)),
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Duration::from_secs)
                    .map_err(|_| SettingsError::InvalidNumber { name, value }),
            }
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_base_url: get("TELEGRAM_API_BASE_URL"),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL"),
            symptoms_path: get("TRIAGE_SYMPTOMS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_SYMPTOMS_PATH), PathBuf::from),
            facilities_path: get("TRIAGE_FACILITIES_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_FACILITIES_PATH), PathBuf::from),
            ai_timeout: seconds("TRIAGE_AI_TIMEOUT_SECS", DEFAULT_AI_TIMEOUT_SECS)?,
            poll_timeout: seconds("TELEGRAM_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?,
        })
    }
}
