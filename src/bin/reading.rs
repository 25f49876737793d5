//! Fetch one reading and print it, without a display.

use airgauge::{
    atmosphere::{gemini::GeminiClient, service::ReadingService},
    config::Settings,
    dashboard::{Dashboard, ViewState},
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    let service = ReadingService::new(GeminiClient::new(&settings), &settings);

    let (mut dashboard, ticket) = Dashboard::mount();
    dashboard.resolve(ticket, service.fetch());

    match dashboard.state() {
        ViewState::Loaded(r) => {
            let aqi = r.aqi().map(|v| v.to_string()).unwrap_or_else(|| "?".into());
            println!("{} air quality at {}", settings.city, r.retrieved_at());
            println!("AQI: {aqi} ({})", r.level().label());
            if r.level().is_high_risk() {
                println!("WARNING: stay indoors and keep windows closed.");
            }
            println!("{}", r.summary());
            for source in r.sources() {
                println!("  - {} <{}>", source.title, source.uri);
            }
        }
        ViewState::Error(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        ViewState::Loading => unreachable!("resolved above"),
    }
}
