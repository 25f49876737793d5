//! One round-trip from "what's the air like?" to a [Reading].

use chrono::Local;

use super::{parse::parse_response, Backend, BackendError, GenerateOptions, Generation, Reading};
use crate::config::Settings;

/// Asks a [Backend] for the current AQI of one city.
///
/// Every call to [ReadingService::fetch] is an independent request:
/// there is no retry, caching, or rate limiting here.
pub struct ReadingService<B> {
    backend: B,
    city: String,
    source: String,
}

impl<B: Backend> ReadingService<B> {
    pub fn new(backend: B, settings: &Settings) -> Self {
        ReadingService {
            backend,
            city: settings.city.clone(),
            source: settings.source.clone(),
        }
    }

    /// The instruction sent to the backend.
    pub fn prompt(&self) -> String {
        prompt(&self.city, &self.source)
    }

    /// Fetch a fresh reading.
    ///
    /// Fails only when the backend call itself fails;
    /// an unhelpful answer still yields a (degraded) reading.
    pub fn fetch(&self) -> Result<Reading, BackendError> {
        let prompt = self.prompt();
        tracing::debug!(city = %self.city, "requesting reading");
        let generation = self
            .backend
            .generate(&prompt, &GenerateOptions { search_grounding: true })
            .inspect_err(|e| tracing::error!("error fetching reading: {e}"))?;

        Ok(to_reading(&generation))
    }
}

/// Ask for the live AQI of `city` as published by `source`, in a fixed two-line format.
pub fn prompt(city: &str, source: &str) -> String {
    format!(
        "Search the web for the official online air quality index of {city} \
         published by {source}.\n\
         The goal is the most accurate pollution index (AQI) at this moment (the live index).\n\
         \n\
         Answer in exactly this format:\n\
         AQI: [digits only, using English numerals]\n\
         Summary: [the air condition and one short health recommendation, at most two \
         sentences. If the site states when the index was last updated, mention it.]\n\
         \n\
         If no live figure is available, give the average of the past 24 hours instead \
         and say in the summary that it is a 24-hour average."
    )
}

/// Parse a backend answer and stamp it with the current local time.
pub fn to_reading(generation: &Generation) -> Reading {
    let parsed = parse_response(&generation.text, &generation.citations);
    let retrieved_at = Local::now().format("%H:%M").to_string();
    tracing::info!(
        aqi = ?parsed.aqi,
        level = ?parsed.level,
        sources = parsed.sources.len(),
        "parsed reading at {retrieved_at}"
    );
    Reading::new(parsed, retrieved_at)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::atmosphere::{FakeBackend, GroundingChunk, Level};

    /// Records what it was asked, then answers like the wrapped fake.
    struct Recorder {
        inner: FakeBackend,
        calls: Mutex<Vec<(String, GenerateOptions)>>,
    }

    impl Backend for Recorder {
        fn generate(
            &self,
            prompt: &str,
            opts: &GenerateOptions,
        ) -> Result<Generation, BackendError> {
            self.calls.lock().unwrap().push((prompt.to_owned(), *opts));
            self.inner.generate(prompt, opts)
        }
    }

    struct Offline;

    impl Backend for Offline {
        fn generate(&self, _: &str, _: &GenerateOptions) -> Result<Generation, BackendError> {
            Err(BackendError::Transport("connection refused".into()))
        }
    }

    #[test]
    fn prompt_names_city_source_and_format() {
        let service = ReadingService::new(FakeBackend::default(), &Settings::default());
        let prompt = service.prompt();
        assert!(prompt.contains("Tehran"));
        assert!(prompt.contains("airnow.tehran.ir"));
        assert!(prompt.contains("AQI: "));
        assert!(prompt.contains("Summary: "));
        assert!(prompt.contains("24 hours"));
    }

    #[test]
    fn fetch_parses_and_stamps() {
        let backend = Recorder {
            inner: FakeBackend {
                generation: Generation {
                    text: "AQI: 163\nSummary: Unhealthy. Avoid outdoor exercise.".into(),
                    citations: vec![GroundingChunk::web(
                        "https://airnow.tehran.ir/",
                        Some("AirNow"),
                    )],
                },
            },
            calls: Mutex::new(Vec::new()),
        };
        let service = ReadingService::new(backend, &Settings::default());
        let reading = service.fetch().unwrap();

        assert_eq!(reading.aqi(), Some(163));
        assert_eq!(reading.level(), Level::Unhealthy);
        assert_eq!(reading.summary(), "Unhealthy. Avoid outdoor exercise.");
        assert_eq!(reading.sources().len(), 1);
        let stamp = reading.retrieved_at();
        assert_eq!(stamp.len(), 5);
        assert_eq!(&stamp[2..3], ":");

        let calls = service.backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.search_grounding);
    }

    #[test]
    fn each_fetch_is_a_new_request() {
        let backend = Recorder {
            inner: FakeBackend::with_text("AQI: 20"),
            calls: Mutex::new(Vec::new()),
        };
        let service = ReadingService::new(backend, &Settings::default());
        service.fetch().unwrap();
        service.fetch().unwrap();
        assert_eq!(service.backend.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_answer_is_still_a_reading() {
        let service = ReadingService::new(FakeBackend::with_text(""), &Settings::default());
        let reading = service.fetch().unwrap();
        assert_eq!(reading.aqi(), None);
        assert_eq!(reading.level(), Level::Unknown);
        assert_eq!(reading.summary(), "");
    }

    #[test]
    fn backend_failure_propagates() {
        let service = ReadingService::new(Offline, &Settings::default());
        assert!(matches!(service.fetch(), Err(BackendError::Transport(_))));
    }
}
