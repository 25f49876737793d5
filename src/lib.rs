//! An air-quality gauge.
//!
//! Asks a search-grounded language model for a city's current Air Quality Index,
//! extracts the number and a short summary from its answer,
//! and shows them as a colored gauge with status cards on a phone-sized face.
//!
//! # Building
//! - The `simulator` feature (desktop window) requires SDL2 development libraries.
//! - The `web` feature builds for `wasm32-unknown-unknown`; use
//!   `--no-default-features --features web` there, since the HTTP client does not target wasm.
//!
use std::{
    convert::Infallible,
    sync::{mpsc, Arc},
    time::Duration,
};

pub mod atmosphere;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod face;
pub mod framebuffer;

#[cfg(feature = "simulator")]
pub mod simulator;

#[cfg(feature = "web")]
pub mod web;

use atmosphere::{service::ReadingService, Backend, BackendError, Reading};
use context::Context;
use dashboard::{Dashboard, RefreshTicket};
use embedded_graphics_core::pixelcolor::Rgb888;
use face::Renderer;

/// Time between frames; the loading spinner advances once per frame.
const FRAME_PERIOD: Duration = Duration::from_millis(100);

/// Input from the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// The refresh control was activated.
    Refresh,
    /// The user closed the view.
    Quit,
}

/// A surface the face is drawn on, and that the user interacts with.
pub trait Displays {
    /// Access the drawable for the face.
    fn face(
        &mut self,
    ) -> impl embedded_graphics_core::draw_target::DrawTarget<Color = Rgb888, Error = Infallible>;

    /// Flush any pending pixels (i.e. v-sync)
    fn flush(&mut self) -> Result<(), String>;

    /// Input received since the last call.
    fn events(&mut self) -> Vec<UiEvent>;
}

type Outcome = (RefreshTicket, Result<Reading, BackendError>);

/// Fetch on a worker thread; the result comes back over `tx`.
fn dispatch<B>(
    ctx: &Context,
    service: &Arc<ReadingService<B>>,
    tx: &mpsc::Sender<Outcome>,
    ticket: RefreshTicket,
) where
    B: Backend + 'static,
{
    let ctx = ctx.clone();
    let service = service.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = service.fetch();
        // The receiver is gone only once the view has shut down.
        if tx.send((ticket, result)).is_ok() {
            ctx.notify();
        }
    });
}

/// Display routine: runs the view until the context is cancelled or the user quits.
pub fn run<D, B>(ctx: &Context, displays: &mut D, renderer: &Renderer, service: ReadingService<B>)
where
    D: Displays,
    B: Backend + 'static,
{
    let service = Arc::new(service);
    let (tx, rx) = mpsc::channel();

    let (mut dashboard, ticket) = Dashboard::mount();
    tracing::info!("mounted; fetching first reading");
    dispatch(ctx, &service, &tx, ticket);

    let mut frame: u32 = 0;
    while !ctx.is_cancelled() {
        for event in displays.events() {
            match event {
                UiEvent::Refresh => {
                    if let Some(ticket) = dashboard.request_refresh() {
                        dispatch(ctx, &service, &tx, ticket);
                    }
                }
                UiEvent::Quit => {
                    tracing::info!("quit requested");
                    ctx.cancel();
                }
            }
        }
        while let Ok((ticket, result)) = rx.try_recv() {
            dashboard.resolve(ticket, result);
        }

        renderer
            .render(dashboard.state(), frame, &mut displays.face())
            .expect("infallible");
        if let Err(e) = displays.flush() {
            tracing::error!("could not flush display: {e}");
            ctx.cancel();
        }

        frame = frame.wrapping_add(1);
        ctx.wait_timeout(FRAME_PERIOD);
    }
    tracing::info!("view closed");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use embedded_graphics::{draw_target::DrawTargetExt, geometry::Point};

    use super::*;
    use crate::atmosphere::{FakeBackend, GenerateOptions, Generation};
    use crate::config::Settings;
    use crate::face::{level_color, FACE_SIZE};
    use crate::framebuffer::Framebuffer;

    /// Headless displays that replay scripted input, one batch per frame.
    struct Scripted {
        fb: Framebuffer,
        script: Vec<Vec<UiEvent>>,
        frames: usize,
        ctx: Context,
    }

    impl Displays for Scripted {
        fn face(
            &mut self,
        ) -> impl embedded_graphics_core::draw_target::DrawTarget<Color = Rgb888, Error = Infallible>
        {
            self.fb.translated(Point::zero())
        }

        fn flush(&mut self) -> Result<(), String> {
            self.frames += 1;
            Ok(())
        }

        fn events(&mut self) -> Vec<UiEvent> {
            if self.script.is_empty() {
                // Out of script: stop.
                self.ctx.cancel();
                return Vec::new();
            }
            self.script.remove(0)
        }
    }

    /// Counts requests.
    struct Counting {
        inner: FakeBackend,
        calls: Mutex<usize>,
    }

    impl Backend for Counting {
        fn generate(&self, p: &str, o: &GenerateOptions) -> Result<Generation, BackendError> {
            *self.calls.lock().unwrap() += 1;
            self.inner.generate(p, o)
        }
    }

    #[test]
    fn loads_and_draws_reading() {
        let ctx = Context::new();
        let mut displays = Scripted {
            fb: Framebuffer::new(FACE_SIZE),
            // Give the worker plenty of frames to answer.
            script: vec![Vec::new(); 30],
            frames: 0,
            ctx: ctx.clone(),
        };
        let service = ReadingService::new(
            FakeBackend::with_text("AQI: 250\nSummary: Very unhealthy."),
            &Settings::default(),
        );
        run(&ctx, &mut displays, &Renderer::default(), service);

        assert!(displays.frames >= 1);
        let ring = displays.fb.pixel(Point::new(90, 52));
        assert_eq!(ring, Some(level_color(atmosphere::Level::VeryUnhealthy)));
    }

    #[test]
    fn quit_stops_the_loop() {
        let ctx = Context::new();
        let mut displays = Scripted {
            fb: Framebuffer::new(FACE_SIZE),
            script: vec![vec![UiEvent::Quit], Vec::new(), Vec::new()],
            frames: 0,
            ctx: ctx.clone(),
        };
        let service = ReadingService::new(FakeBackend::default(), &Settings::default());
        run(&ctx, &mut displays, &Renderer::default(), service);
        assert_eq!(displays.frames, 1);
        assert_eq!(displays.script.len(), 2);
    }

    #[test]
    fn refresh_spam_is_single_flight() {
        let ctx = Context::new();
        let backend = Arc::new(Counting {
            inner: FakeBackend::with_text("AQI: 10"),
            calls: Mutex::new(0),
        });
        // Three presses in the very first frame, while the mount fetch is still loading.
        let mut script = vec![vec![UiEvent::Refresh; 3]];
        script.extend(vec![Vec::new(); 20]);
        let mut displays = Scripted {
            fb: Framebuffer::new(FACE_SIZE),
            script,
            frames: 0,
            ctx: ctx.clone(),
        };
        let service = ReadingService::new(backend.clone(), &Settings::default());
        run(&ctx, &mut displays, &Renderer::default(), service);
        assert_eq!(*backend.calls.lock().unwrap(), 1);
    }
}
