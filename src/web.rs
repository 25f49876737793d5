//! Browser bindings: the dashboard and face, drawn into a canvas.
//!
//! The page performs the HTTP call itself (so the API key never enters the wasm module)
//! and reports the outcome back:
//!
//! ```js
//! const view = new WebDashboard("Tehran", "airnow.tehran.ir");
//! async function load() {
//!   try {
//!     const r = await callGemini(view.prompt());
//!     view.resolve_response(r.text, JSON.stringify(r.groundingChunks ?? []));
//!   } catch (e) {
//!     view.resolve_failure(String(e));
//!   }
//! }
//! load();
//! canvas.onclick = (e) => { if (view.click(e.offsetX, e.offsetY)) load(); };
//! ```
use embedded_graphics::{geometry::Point, primitives::ContainsPoint};
use log::MakeConsoleWriter;
use wasm_bindgen::{prelude::*, Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::{
    atmosphere::{service, BackendError, Generation, GroundingChunk, Reading},
    config::Settings,
    dashboard::{Dashboard, RefreshTicket},
    face::{Renderer, FACE_SIZE, REFRESH_BUTTON},
    framebuffer::Framebuffer,
};

#[wasm_bindgen(start)]
fn start() {
    tracing_subscriber::fmt::fmt()
        .with_writer(MakeConsoleWriter)
        .without_time()
        .init();

    tracing::info!("airgauge loaded");
}

/// The dashboard, for use from JavaScript.
#[wasm_bindgen]
pub struct WebDashboard {
    dashboard: Dashboard,
    pending: Option<RefreshTicket>,
    renderer: Renderer,
    settings: Settings,
    framebuffer: Framebuffer,
    frame: u32,
}

#[wasm_bindgen]
impl WebDashboard {
    /// Mount the view. It starts out loading; the page should fetch right away.
    #[wasm_bindgen(constructor)]
    pub fn new(city: &str, source: &str) -> WebDashboard {
        let settings = Settings {
            city: city.to_owned(),
            source: source.to_owned(),
            ..Settings::default()
        };
        let (dashboard, ticket) = Dashboard::mount();
        WebDashboard {
            dashboard,
            pending: Some(ticket),
            renderer: Renderer::from(&settings),
            settings,
            framebuffer: Framebuffer::new(FACE_SIZE),
            frame: 0,
        }
    }

    /// Text to send to the model.
    pub fn prompt(&self) -> String {
        service::prompt(&self.settings.city, &self.settings.source)
    }

    pub fn is_loading(&self) -> bool {
        !self.dashboard.refresh_enabled()
    }

    /// Manual refresh. Returns true if the page should start a fetch.
    pub fn request_refresh(&mut self) -> bool {
        match self.dashboard.request_refresh() {
            Some(ticket) => {
                self.pending = Some(ticket);
                true
            }
            None => false,
        }
    }

    /// Handle a click at canvas coordinates. Returns true if the page should start a fetch.
    pub fn click(&mut self, x: i32, y: i32) -> bool {
        REFRESH_BUTTON.contains(Point::new(x, y)) && self.request_refresh()
    }

    /// Report a successful model call.
    ///
    /// `grounding_chunks` is the JSON array from `groundingMetadata.groundingChunks`.
    pub fn resolve_response(&mut self, text: &str, grounding_chunks: &str) {
        let citations: Vec<GroundingChunk> = serde_json::from_str(grounding_chunks)
            .unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed grounding metadata: {e}");
                Vec::new()
            });
        let generation = Generation {
            text: text.to_owned(),
            citations,
        };
        self.resolve(Ok(service::to_reading(&generation)));
    }

    /// Report a failed model call.
    pub fn resolve_failure(&mut self, reason: &str) {
        self.resolve(Err(BackendError::Transport(reason.to_owned())));
    }

    /// Draw the current state into `canvas`, resizing it to the face.
    pub fn draw(&mut self, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
        self.renderer
            .render(self.dashboard.state(), self.frame, &mut self.framebuffer)
            .expect("infallible");
        self.frame = self.frame.wrapping_add(1);

        canvas.set_width(FACE_SIZE.width);
        canvas.set_height(FACE_SIZE.height);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let rgba = self.framebuffer.to_rgba();
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(rgba.as_slice()),
            FACE_SIZE.width,
            FACE_SIZE.height,
        )?;
        ctx.put_image_data(&image, 0.0, 0.0)
    }
}

impl WebDashboard {
    fn resolve(&mut self, result: Result<Reading, BackendError>) {
        match self.pending.take() {
            Some(ticket) => self.dashboard.resolve(ticket, result),
            None => tracing::warn!("no fetch outstanding; ignoring result"),
        }
    }
}

mod log {
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    /// Makes a writer to the web_sys console.
    pub struct MakeConsoleWriter;

    impl MakeWriter<'_> for MakeConsoleWriter {
        type Writer = MakeConsoleWriter;

        fn make_writer(&'_ self) -> Self::Writer {
            MakeConsoleWriter
        }
    }

    impl std::io::Write for MakeConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            // One event per call; strip the trailing newline the console adds anyway.
            let line = String::from_utf8_lossy(buf);
            web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
