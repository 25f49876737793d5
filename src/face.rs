//! Drawing routines for the face: header, gauge, and info cards.
//!
//! The face is a phone-sized 180x320 portrait canvas.
//! Everything here is a pure function of the [ViewState] (plus an animation frame
//! counter for the loading spinner).

use embedded_graphics::{
    geometry::{Angle, Dimensions, Point, Size},
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::{Rgb888, RgbColor},
    prelude::DrawTarget,
    primitives::{Arc, Circle, Primitive, PrimitiveStyleBuilder, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};

use crate::atmosphere::{Level, Reading};
use crate::config::Settings;
use crate::dashboard::ViewState;

/// Size of the face, in pixels.
pub const FACE_SIZE: Size = Size::new(180, 320);

/// Hit area of the refresh control.
pub const REFRESH_BUTTON: Rectangle = Rectangle::new(Point::new(146, 10), Size::new(24, 24));

const HEADER_HEIGHT: u32 = 96;
const GAUGE_TOP_LEFT: Point = Point::new(30, 50);
const GAUGE_DIAMETER: u32 = 120;
const GAUGE_STROKE: u32 = 10;
const CARD_X: i32 = 8;
const CARD_WIDTH: u32 = 164;
const CARD_PADDING: i32 = 8;
const CARD_GAP: i32 = 8;
const FIRST_CARD_Y: i32 = 180;

const BACKGROUND: Rgb888 = Rgb888::new(249, 250, 251);
const TEXT: Rgb888 = Rgb888::new(31, 41, 55);
const MUTED: Rgb888 = Rgb888::new(107, 114, 128);
const TRACK: Rgb888 = Rgb888::new(229, 231, 235);
const LOADING_TINT: Rgb888 = Rgb888::new(96, 165, 250);
const SPINNER: Rgb888 = Rgb888::new(59, 130, 246);

const WARNING_TITLE: &str = "Serious warning!";
const WARNING_BODY: &str = "Today's air is dangerous to your health. Stay indoors as much as \
                            possible and keep windows closed.";
const NO_SUMMARY: &str = "No information found.";

/// Color of the gauge ring for a level.
pub fn level_color(level: Level) -> Rgb888 {
    match level {
        Level::Good => Rgb888::new(34, 197, 94),
        Level::Moderate => Rgb888::new(234, 179, 8),
        Level::UnhealthySensitive => Rgb888::new(249, 115, 22),
        Level::Unhealthy => Rgb888::new(220, 38, 38),
        Level::VeryUnhealthy => Rgb888::new(147, 51, 234),
        Level::Hazardous => Rgb888::new(159, 18, 57),
        Level::Unknown => Rgb888::new(156, 163, 175),
    }
}

/// Background of the header band.
pub fn header_tint(state: &ViewState) -> Rgb888 {
    match state {
        ViewState::Loading => LOADING_TINT,
        ViewState::Loaded(r) => match r.level() {
            Level::Good => Rgb888::new(220, 252, 231),
            Level::Moderate => Rgb888::new(254, 249, 195),
            Level::UnhealthySensitive => Rgb888::new(255, 237, 213),
            _ => Rgb888::new(254, 226, 226),
        },
        ViewState::Error(_) => Rgb888::new(254, 226, 226),
    }
}

/// Renders whole frames for one city.
#[derive(Clone, Debug)]
pub struct Renderer {
    title: String,
}

impl Default for Renderer {
    fn default() -> Self {
        (&Settings::default()).into()
    }
}

impl From<&Settings> for Renderer {
    fn from(settings: &Settings) -> Self {
        Renderer {
            title: format!("{} Air", settings.city),
        }
    }
}

impl Renderer {
    /// Render the face onto the provided DrawTarget.
    pub fn render<D>(&self, state: &ViewState, frame: u32, canvas: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        canvas.clear(BACKGROUND)?;
        self.header(state, canvas)?;
        match state {
            ViewState::Loading => loading(frame, canvas),
            ViewState::Error(message) => {
                card(canvas, FIRST_CARD_Y - 60, "Error", message, Some('!'), true)?;
                Ok(())
            }
            ViewState::Loaded(reading) => loaded(reading, canvas),
        }
    }

    fn header<D>(&self, state: &ViewState, canvas: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let width = canvas.bounding_box().size.width;
        Rectangle::new(Point::zero(), Size::new(width, HEADER_HEIGHT))
            .into_styled(PrimitiveStyleBuilder::new().fill_color(header_tint(state)).build())
            .draw(canvas)?;

        text_at(canvas, &self.title, Point::new(10, 10), &FONT_10X20, TEXT)?;
        let subtitle = match state {
            ViewState::Loading => "Checking...".to_owned(),
            ViewState::Loaded(r) => format!("Updated {}", r.retrieved_at()),
            ViewState::Error(_) => String::new(),
        };
        text_at(canvas, &subtitle, Point::new(10, 32), &FONT_6X10, MUTED)?;

        let enabled = !matches!(state, ViewState::Loading);
        let (fill, ink) = if enabled {
            (Rgb888::WHITE, TEXT)
        } else {
            (TRACK, MUTED)
        };
        RoundedRectangle::with_equal_corners(REFRESH_BUTTON, Size::new(6, 6))
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(fill)
                    .stroke_color(ink)
                    .stroke_width(1)
                    .build(),
            )
            .draw(canvas)?;
        centered(canvas, "R", REFRESH_BUTTON.center(), &FONT_10X20, ink)?;
        Ok(())
    }
}

fn loading<D>(frame: u32, canvas: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let track = PrimitiveStyleBuilder::new()
        .stroke_color(TRACK)
        .stroke_width(4)
        .build();
    Circle::new(GAUGE_TOP_LEFT, GAUGE_DIAMETER)
        .into_styled(track)
        .draw(canvas)?;

    let start = Angle::from_degrees((frame % 12) as f32 * 30.0);
    Arc::new(GAUGE_TOP_LEFT, GAUGE_DIAMETER, start, Angle::from_degrees(90.0))
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_color(SPINNER)
                .stroke_width(4)
                .build(),
        )
        .draw(canvas)?;

    let below = GAUGE_TOP_LEFT.y + GAUGE_DIAMETER as i32 + 24;
    centered(
        canvas,
        "Fetching data...",
        Point::new(FACE_SIZE.width as i32 / 2, below),
        &FONT_6X10,
        MUTED,
    )
}

fn loaded<D>(reading: &Reading, canvas: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    gauge(canvas, reading.aqi(), reading.level())?;

    let mut y = FIRST_CARD_Y;
    if reading.level().is_high_risk() {
        y = card(canvas, y, WARNING_TITLE, WARNING_BODY, Some('!'), true)? + CARD_GAP;
    }
    let summary = if reading.summary().is_empty() {
        NO_SUMMARY
    } else {
        reading.summary()
    };
    y = card(canvas, y, "Details", summary, Some('i'), false)? + CARD_GAP;

    if !reading.sources().is_empty() {
        let titles = reading
            .sources()
            .iter()
            .map(|s| format!("- {}", s.title))
            .collect::<Vec<_>>()
            .join("\n");
        card(canvas, y, "Sources", &titles, None, false)?;
    }
    Ok(())
}

/// Draw the gauge: a ring in the level's color around the index and level label.
pub fn gauge<D>(canvas: &mut D, aqi: Option<u32>, level: Level) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let color = level_color(level);
    Circle::new(GAUGE_TOP_LEFT, GAUGE_DIAMETER)
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(Rgb888::WHITE)
                .stroke_color(color)
                .stroke_width(GAUGE_STROKE)
                .build(),
        )
        .draw(canvas)?;

    let center = Circle::new(GAUGE_TOP_LEFT, GAUGE_DIAMETER).center();
    let value = aqi.map(|v| v.to_string()).unwrap_or_else(|| "?".to_owned());
    centered(canvas, &value, center - Point::new(0, 12), &FONT_10X20, TEXT)?;
    centered(canvas, level.label(), center + Point::new(0, 10), &FONT_6X10, color)?;
    centered(canvas, "AQI", center + Point::new(0, 24), &FONT_6X10, MUTED)?;
    Ok(())
}

/// Draw a bordered card starting at `y`; returns the y coordinate just below it.
pub fn card<D>(
    canvas: &mut D,
    y: i32,
    title: &str,
    body: &str,
    icon: Option<char>,
    warning: bool,
) -> Result<i32, D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let (fill, border, title_ink, body_ink) = if warning {
        (
            Rgb888::new(254, 242, 242),
            Rgb888::new(254, 202, 202),
            Rgb888::new(185, 28, 28),
            Rgb888::new(127, 29, 29),
        )
    } else {
        (Rgb888::WHITE, TRACK, Rgb888::new(17, 24, 39), TEXT)
    };

    let line_height = FONT_6X10.character_size.height as i32 + 1;
    let columns = (CARD_WIDTH as i32 - 2 * CARD_PADDING) / FONT_6X10.character_size.width as i32;
    let lines = wrap(body, columns as usize);
    let height = CARD_PADDING * 2 + 16 + lines.len() as i32 * line_height;

    let bounds = Rectangle::new(Point::new(CARD_X, y), Size::new(CARD_WIDTH, height as u32));
    RoundedRectangle::with_equal_corners(bounds, Size::new(8, 8))
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(fill)
                .stroke_color(border)
                .stroke_width(1)
                .build(),
        )
        .draw(canvas)?;

    let mut x = CARD_X + CARD_PADDING;
    let top = y + CARD_PADDING;
    if let Some(icon) = icon {
        let mut buf = [0u8; 4];
        text_at(canvas, icon.encode_utf8(&mut buf), Point::new(x, top), &FONT_6X10, title_ink)?;
        x += 2 * FONT_6X10.character_size.width as i32;
    }
    text_at(canvas, title, Point::new(x, top), &FONT_6X10, title_ink)?;

    let mut line_y = top + 16;
    for line in &lines {
        text_at(
            canvas,
            line,
            Point::new(CARD_X + CARD_PADDING, line_y),
            &FONT_6X10,
            body_ink,
        )?;
        line_y += line_height;
    }
    Ok(y + height)
}

/// Greedy word wrap to `columns` characters. Explicit newlines are kept.
pub fn wrap(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(columns);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if len > 0 && len + 1 + word.len() > columns {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            len += word.len();
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

fn text_at<D>(
    canvas: &mut D,
    text: &str,
    top_left: Point,
    font: &MonoFont<'_>,
    color: Rgb888,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let style = TextStyleBuilder::new().baseline(Baseline::Top).build();
    Text::with_text_style(text, top_left, MonoTextStyle::new(font, color), style).draw(canvas)?;
    Ok(())
}

fn centered<D>(
    canvas: &mut D,
    text: &str,
    center: Point,
    font: &MonoFont<'_>,
    color: Rgb888,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(text, center, MonoTextStyle::new(font, color), style).draw(canvas)?;
    Ok(())
}
