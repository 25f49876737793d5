//! Backend for the Google Generative Language API.
//!
//! Uses `models/{model}:generateContent`, optionally with the `google_search` tool so
//! the answer is grounded in live search results. See
//! <https://ai.google.dev/api/generate-content> and
//! <https://ai.google.dev/gemini-api/docs/google-search>.
//!
//! Notes on the response shape:
//!
//! - `.candidates[0].content.parts[].text` holds the answer, possibly split over parts.
//! - `.candidates[0].groundingMetadata.groundingChunks[].web.{uri,title}` holds citations;
//!   any of these may be missing.
//! - A blocked or empty answer has no `content` at all, which we treat as empty text.

use serde::Deserialize;
use serde_json::json;

use super::{Backend, BackendError, GenerateOptions, Generation, GroundingChunk};
use crate::config::Settings;

/// Blocking client for `generateContent`.
pub struct GeminiClient {
    agent: ureq::Agent,
    api_key: Option<String>,
    url: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();
        let url = format!(
            "{}/models/{}:generateContent",
            settings.endpoint.trim_end_matches('/'),
            settings.model
        );
        GeminiClient {
            agent,
            api_key: settings.api_key.clone(),
            url,
        }
    }
}

impl Backend for GeminiClient {
    fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<Generation, BackendError> {
        let key = self.api_key.as_deref().ok_or(BackendError::MissingApiKey)?;

        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if opts.search_grounding {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        tracing::debug!(url = %self.url, grounding = opts.search_grounding, "POST");
        let response = self
            .agent
            .post(&self.url)
            .set("x-goog-api-key", key)
            .send_json(&body);

        match response {
            Ok(response) => {
                let decoded: GenerateContentResponse = response
                    .into_json()
                    .map_err(|e| BackendError::Decode(e.to_string()))?;
                Ok(decoded.into_generation())
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(BackendError::Status { code, body })
            }
            Err(ureq::Error::Transport(t)) => Err(BackendError::Transport(t.to_string())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

impl GenerateContentResponse {
    /// Flatten the first candidate into text plus citations.
    fn into_generation(self) -> Generation {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Generation::default();
        };
        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        let citations = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default();
        Generation { text, citations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDED: &str = r#"{
      "candidates": [{
        "content": {
          "role": "model",
          "parts": [{"text": "AQI: 142\n"}, {"text": "Summary: Unhealthy for sensitive groups."}]
        },
        "finishReason": "STOP",
        "groundingMetadata": {
          "webSearchQueries": ["tehran air quality index"],
          "groundingChunks": [
            {"web": {"uri": "https://vertexaisearch.cloud.google.com/grounding-api-redirect/abc", "title": "airnow.tehran.ir"}},
            {"web": {"uri": "https://vertexaisearch.cloud.google.com/grounding-api-redirect/def"}},
            {"retrievedContext": {}}
          ]
        }
      }],
      "usageMetadata": {"promptTokenCount": 120}
    }"#;

    #[test]
    fn decodes_recorded_response() {
        let decoded: GenerateContentResponse = serde_json::from_str(RECORDED).unwrap();
        let g = decoded.into_generation();
        assert_eq!(g.text, "AQI: 142\nSummary: Unhealthy for sensitive groups.");
        assert_eq!(g.citations.len(), 3);
        assert_eq!(
            g.citations[0].web.as_ref().and_then(|w| w.title.as_deref()),
            Some("airnow.tehran.ir")
        );
        assert_eq!(g.citations[1].web.as_ref().and_then(|w| w.title.as_deref()), None);
        assert_eq!(g.citations[2].web, None);
    }

    #[test]
    fn no_candidates_is_empty() {
        let decoded: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "OTHER"}}"#).unwrap();
        assert_eq!(decoded.into_generation(), Generation::default());

        let decoded: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(decoded.into_generation(), Generation::default());
    }

    #[test]
    fn missing_key_fails_on_first_call() {
        let client = GeminiClient::new(&Settings::default());
        let err = client
            .generate("hello", &GenerateOptions::default())
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingApiKey));
    }

    #[test]
    fn url_is_built_from_settings() {
        let settings = Settings {
            endpoint: "http://localhost:9/v1beta/".into(),
            model: "test-model".into(),
            ..Settings::default()
        };
        let client = GeminiClient::new(&settings);
        assert_eq!(
            client.url,
            "http://localhost:9/v1beta/models/test-model:generateContent"
        );
    }
}
