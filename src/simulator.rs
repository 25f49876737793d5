//! Desktop window showing the face, via the embedded-graphics simulator.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTargetExt,
    geometry::Point,
    pixelcolor::Rgb888,
    primitives::{ContainsPoint, Rectangle},
};
use embedded_graphics_simulator::{
    sdl2::Keycode, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};

use crate::{
    face::{FACE_SIZE, REFRESH_BUTTON},
    Displays, UiEvent,
};

const SCALE: u32 = 2;

pub struct SimDisplays {
    display: SimulatorDisplay<Rgb888>,
    window: Window,
    // The window has no event pump until it has been drawn once.
    shown: bool,
}

impl SimDisplays {
    pub fn new(title: &str) -> Self {
        let settings = OutputSettingsBuilder::new().scale(SCALE).build();
        SimDisplays {
            display: SimulatorDisplay::new(FACE_SIZE),
            window: Window::new(title, &settings),
            shown: false,
        }
    }
}

/// Map one window event to view input.
fn translate(event: SimulatorEvent) -> Option<UiEvent> {
    match event {
        SimulatorEvent::Quit => Some(UiEvent::Quit),
        SimulatorEvent::KeyDown { keycode, .. } => match keycode {
            Keycode::R | Keycode::F5 => Some(UiEvent::Refresh),
            Keycode::Escape | Keycode::Q => Some(UiEvent::Quit),
            _ => None,
        },
        // The simulator reports points in display coordinates.
        SimulatorEvent::MouseButtonUp { point, .. } if REFRESH_BUTTON.contains(point) => {
            Some(UiEvent::Refresh)
        }
        _ => None,
    }
}

impl Displays for SimDisplays {
    fn face(
        &mut self,
    ) -> impl embedded_graphics_core::draw_target::DrawTarget<Color = Rgb888, Error = Infallible>
    {
        // Clipped ensures that OOB writes get dropped.
        self.display
            .clipped(&Rectangle::new(Point::zero(), FACE_SIZE))
    }

    fn flush(&mut self) -> Result<(), String> {
        self.window.update(&self.display);
        self.shown = true;
        Ok(())
    }

    fn events(&mut self) -> Vec<UiEvent> {
        if !self.shown {
            return Vec::new();
        }
        self.window.events().filter_map(translate).collect()
    }
}
