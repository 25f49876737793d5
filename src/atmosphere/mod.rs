//! Types for surfacing air-quality readings.
//!
//! A [Reading] is produced by asking a search-grounded language model
//! (a [Backend]) for the current Air Quality Index of a city,
//! then parsing its loosely-structured reply with [parse::parse_response].

use serde::{Deserialize, Serialize};

pub mod parse;
pub mod service;

#[cfg(feature = "gemini")]
pub mod gemini;

/// Severity bucket for air quality.
///
/// Variants are listed from least to most severe; `Unknown` sits outside that ordering.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    #[default]
    Unknown,
}

impl Level {
    /// All levels, in severity order, followed by `Unknown`.
    pub const ALL: [Level; 7] = [
        Level::Good,
        Level::Moderate,
        Level::UnhealthySensitive,
        Level::Unhealthy,
        Level::VeryUnhealthy,
        Level::Hazardous,
        Level::Unknown,
    ];

    /// Bucket a numeric AQI using the standard inclusive thresholds.
    pub fn from_index(aqi: u32) -> Level {
        match aqi {
            0..=50 => Level::Good,
            51..=100 => Level::Moderate,
            101..=150 => Level::UnhealthySensitive,
            151..=200 => Level::Unhealthy,
            201..=300 => Level::VeryUnhealthy,
            _ => Level::Hazardous,
        }
    }

    /// Rank from 0 (Good) to 5 (Hazardous); `None` for `Unknown`.
    pub fn severity(self) -> Option<u8> {
        match self {
            Level::Good => Some(0),
            Level::Moderate => Some(1),
            Level::UnhealthySensitive => Some(2),
            Level::Unhealthy => Some(3),
            Level::VeryUnhealthy => Some(4),
            Level::Hazardous => Some(5),
            Level::Unknown => None,
        }
    }

    /// Whether this level warrants the prominent health warning.
    pub fn is_high_risk(self) -> bool {
        matches!(
            self,
            Level::Unhealthy | Level::VeryUnhealthy | Level::Hazardous
        )
    }

    /// Short user-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Level::Good => "Clean",
            Level::Moderate => "Acceptable",
            Level::UnhealthySensitive => "Sensitive groups",
            Level::Unhealthy => "Unhealthy",
            Level::VeryUnhealthy => "Very unhealthy",
            Level::Hazardous => "Hazardous",
            Level::Unknown => "Unspecified",
        }
    }
}

/// A web page the backend cited while answering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// One air-quality observation, as shown to the user.
///
/// Readings are never mutated; a refresh builds a new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reading {
    aqi: Option<u32>,
    level: Level,
    summary: String,
    sources: Vec<Source>,
    retrieved_at: String,
}

impl Reading {
    /// Combine parsed response fields with the time they were retrieved.
    pub fn new(parsed: parse::ParsedResponse, retrieved_at: impl Into<String>) -> Self {
        let parse::ParsedResponse {
            aqi,
            level,
            summary,
            sources,
        } = parsed;
        Reading {
            aqi,
            level,
            summary,
            sources,
            retrieved_at: retrieved_at.into(),
        }
    }

    /// Numeric index, if the response contained one.
    pub fn aqi(&self) -> Option<u32> {
        self.aqi
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Prose description, with the raw `AQI:` line and labels removed.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Health advice for display.
    ///
    /// The backend is asked for a single summary that includes advice,
    /// so this is the same text as [Reading::summary].
    pub fn recommendation(&self) -> &str {
        &self.summary
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Local wall-clock time (`HH:MM`) at which this reading was retrieved.
    pub fn retrieved_at(&self) -> &str {
        &self.retrieved_at
    }
}

/// Options for a [Backend::generate] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Back the generated text with live web search results.
    pub search_grounding: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            search_grounding: true,
        }
    }
}

/// Web part of a grounding citation; every field may be absent on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One entry of the backend's grounding metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

impl GroundingChunk {
    /// Shorthand for a web citation.
    pub fn web(uri: &str, title: Option<&str>) -> Self {
        GroundingChunk {
            web: Some(WebChunk {
                uri: Some(uri.to_owned()),
                title: title.map(str::to_owned),
            }),
        }
    }
}

/// Output of one backend round-trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub citations: Vec<GroundingChunk>,
}

/// Failure to complete a round-trip with the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No API key was configured.
    #[error("no API key configured; set API_KEY or GEMINI_API_KEY")]
    MissingApiKey,

    /// The request did not reach the service, or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an error status (including auth failures).
    #[error("backend returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The response body was not what we expected.
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// A text-in / text-out generative service with search grounding.
pub trait Backend: Send + Sync {
    /// Generate a response to `prompt`.
    fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<Generation, BackendError>;
}

impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<Generation, BackendError> {
        (**self).generate(prompt, opts)
    }
}

/// Fake backend: repeatedly provides the indicated generation.
#[derive(Clone, Debug, Default)]
pub struct FakeBackend {
    pub generation: Generation,
}

impl FakeBackend {
    /// A fake that answers with `text` and no citations.
    pub fn with_text(text: &str) -> Self {
        FakeBackend {
            generation: Generation {
                text: text.to_owned(),
                citations: Vec::new(),
            },
        }
    }
}

impl Backend for FakeBackend {
    fn generate(&self, _prompt: &str, _opts: &GenerateOptions) -> Result<Generation, BackendError> {
        Ok(self.generation.clone())
    }
}
