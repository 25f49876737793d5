//! Runtime settings, read from the process environment.

use std::time::Duration;

/// Settings for the reading service and its backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Generative Language API key. Absence is reported on the first request, not at startup.
    pub api_key: Option<String>,
    /// Model to ask.
    pub model: String,
    /// City whose air quality is shown.
    pub city: String,
    /// Authoritative site the model is asked to consult.
    pub source: String,
    /// Base URL of the Generative Language API.
    pub endpoint: String,
    /// HTTP timeout for one request.
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            model: "gemini-2.5-flash".to_owned(),
            city: "Tehran".to_owned(),
            source: "airnow.tehran.ir".to_owned(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Settings {
    /// Read settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let timeout = match get("AIRGAUGE_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    tracing::warn!("ignoring AIRGAUGE_TIMEOUT_SECS={v:?}: {e}");
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };

        Settings {
            api_key: get("API_KEY").or_else(|| get("GEMINI_API_KEY")),
            model: get("AIRGAUGE_MODEL").unwrap_or(defaults.model),
            city: get("AIRGAUGE_CITY").unwrap_or(defaults.city),
            source: get("AIRGAUGE_SOURCE").unwrap_or(defaults.source),
            endpoint: get("AIRGAUGE_ENDPOINT").unwrap_or(defaults.endpoint),
            timeout,
        }
    }
}
