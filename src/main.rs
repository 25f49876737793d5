use airgauge::{
    atmosphere::{gemini::GeminiClient, service::ReadingService},
    config::Settings,
    context::Context,
    face::Renderer,
    simulator::SimDisplays,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = Context::new();
    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, closing context");
            ctx.cancel();
        })
        .expect("could not set SIGINT handler");
    }

    let settings = Settings::from_env();
    if settings.api_key.is_none() {
        tracing::warn!("no API key set; fetches will fail until API_KEY is provided");
    }
    let service = ReadingService::new(GeminiClient::new(&settings), &settings);
    let renderer = Renderer::from(&settings);
    let mut displays = SimDisplays::new(&format!("{} air quality", settings.city));

    airgauge::run(&ctx, &mut displays, &renderer, service);
    ctx.cancel();

    tracing::info!("shut down");
}
