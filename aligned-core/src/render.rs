//! Backend-agnostic frame drawing.

use crate::annotations::AnnotationStore;
use crate::palette::Palette;
use crate::samples::SampleBuffer;
use crate::viewport::{decimated_indices, y_to_px, Viewport, WindowLayout};
use session::{Rgb, ViewerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const GRID: Color = Color::rgba(0x90, 0xa4, 0xae, 0x60);
    pub const LABEL: Color = Color::rgba(0x90, 0xa4, 0xae, 0xff);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::rgba(rgb.r, rgb.g, rgb.b, 0xff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub fn new(width: f32, color: impl Into<Color>) -> Self {
        Self {
            width,
            color: color.into(),
        }
    }
}

/// A drawing surface with its origin at the top-left corner.
pub trait Canvas {
    fn size(&self) -> (f32, f32);
    fn clear(&mut self);
    fn line(&mut self, from: Point, to: Point, stroke: Stroke);
    fn polyline(&mut self, points: &[Point], stroke: Stroke);
    fn fill_rect(&mut self, min: Point, size: Point, color: Color);
    fn stroke_rect(&mut self, min: Point, size: Point, stroke: Stroke);
    fn text(&mut self, pos: Point, text: &str, color: Color);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Line { from: Point, to: Point, stroke: Stroke },
    Polyline { points: Vec<Point>, stroke: Stroke },
    FillRect { min: Point, size: Point, color: Color },
    StrokeRect { min: Point, size: Point, stroke: Stroke },
    Text { pos: Point, text: String, color: Color },
}

/// Records draw calls instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn polylines(&self) -> Vec<(&[Point], Stroke)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Polyline { points, stroke } => Some((points.as_slice(), *stroke)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn filled_rects(&self) -> Vec<(Point, Point, Color)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::FillRect { min, size, color } => Some((*min, *size, *color)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke,
        });
    }

    fn fill_rect(&mut self, min: Point, size: Point, color: Color) {
        self.commands.push(DrawCommand::FillRect { min, size, color });
    }

    fn stroke_rect(&mut self, min: Point, size: Point, stroke: Stroke) {
        self.commands.push(DrawCommand::StrokeRect { min, size, stroke });
    }

    fn text(&mut self, pos: Point, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_string(),
            color,
        });
    }
}

pub const LINE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct Renderer {
    pub palette: Palette,
    pub tick_count: usize,
    pub show_grid: bool,
    pub band_alpha: u8,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_settings(&ViewerSettings::default())
    }
}

impl Renderer {
    pub fn from_settings(settings: &ViewerSettings) -> Self {
        Self {
            palette: Palette::from_settings(&settings.palette),
            tick_count: settings.viewport.tick_count.max(1),
            show_grid: settings.viewport.show_grid,
            band_alpha: settings.annotations.band_alpha,
        }
    }

    /// Draws one frame. Without a surface the frame is skipped and `false`
    /// returned; the next frame tries again.
    pub fn render(
        &self,
        canvas: Option<&mut dyn Canvas>,
        buffer: &SampleBuffer,
        viewport: &Viewport,
        annotations: &AnnotationStore,
    ) -> bool {
        let Some(canvas) = canvas else {
            log::warn!("no drawing surface available, skipping frame");
            return false;
        };
        let (width, height) = canvas.size();
        if !(width > 0.0 && height > 0.0) {
            log::debug!("drawing surface has no area ({width}x{height}), skipping frame");
            return false;
        }
        let (w, h) = (f64::from(width), f64::from(height));
        let (y_min, y_max) = viewport.y_bounds(buffer);

        canvas.clear();

        let zero_y = y_to_px(0.0, y_min, y_max, h);
        if (0.0..=h).contains(&zero_y) {
            canvas.line(
                Point::new(0.0, zero_y as f32),
                Point::new(width, zero_y as f32),
                Stroke::new(1.0, self.palette.zero_line),
            );
        }

        if self.show_grid {
            self.draw_grid(canvas, viewport, w, h);
        }

        self.draw_bands(canvas, viewport, annotations, w, h);

        canvas.line(
            Point::new(width / 2.0, 0.0),
            Point::new(width / 2.0, height),
            Stroke::new(1.0, self.palette.zero_line),
        );

        if let Some(layout) = viewport.layout(buffer.times(), w) {
            for (idx, values) in buffer.channels().enumerate() {
                let points =
                    build_polyline(buffer.times(), values, viewport, &layout, (y_min, y_max), (w, h));
                canvas.polyline(&points, Stroke::new(LINE_WIDTH, self.palette.channel_color(idx)));
            }
        }
        true
    }

    fn draw_grid(&self, canvas: &mut dyn Canvas, viewport: &Viewport, w: f64, h: f64) {
        let interval = viewport.window_size() / self.tick_count as f64;
        for time in tick_times(viewport, self.tick_count) {
            let x = viewport.x_at_time(time, w) as f32;
            canvas.line(
                Point::new(x, 0.0),
                Point::new(x, h as f32),
                Stroke::new(1.0, Color::GRID),
            );
            canvas.text(
                Point::new(x + 3.0, h as f32 - 14.0),
                &format_tick_label(time, interval),
                Color::LABEL,
            );
        }
    }

    fn draw_bands(
        &self,
        canvas: &mut dyn Canvas,
        viewport: &Viewport,
        annotations: &AnnotationStore,
        w: f64,
        h: f64,
    ) {
        for band in annotations.visible_in(viewport, w) {
            let Some(annotation) = annotations.get(band.index) else {
                continue;
            };
            let rgb = annotations
                .color_index(annotation)
                .map(|idx| self.palette.tag_color(idx))
                .unwrap_or(self.palette.untagged);
            let min = Point::new(band.x as f32, 0.0);
            let size = Point::new(band.width as f32, h as f32);
            canvas.fill_rect(min, size, Color::from(rgb).with_alpha(self.band_alpha));
            if annotations.selected() == Some(band.index) {
                canvas.stroke_rect(min, size, Stroke::new(LINE_WIDTH, rgb));
            }
        }
    }
}

/// Pixel points for one channel over the decimated walk of `layout`.
pub fn build_polyline(
    times: &[f64],
    values: &[f64],
    viewport: &Viewport,
    layout: &WindowLayout,
    (y_min, y_max): (f64, f64),
    (width, height): (f64, f64),
) -> Vec<Point> {
    let start = layout.indices.start as f64;
    let span = layout.indices.span() as f64;
    let x_range = layout.end_x - layout.start_x;
    decimated_indices(layout.indices, layout.stride, times.len().min(values.len()))
        .into_iter()
        .filter_map(|i| {
            let value = *values.get(i)?;
            let x = if span > 0.0 {
                (i as f64 - start) / span * x_range + layout.start_x
            } else {
                viewport.x_at_time(times[i], width)
            };
            let y = y_to_px(value, y_min, y_max, height);
            Some(Point::new(x as f32, y as f32))
        })
        .collect()
}

/// Gridline times. The interval is `window / tick_count` and the ticks sit on
/// multiples of it, so labels stay put while the playhead moves.
pub fn tick_times(viewport: &Viewport, tick_count: usize) -> Vec<f64> {
    let tick_count = tick_count.max(1);
    let interval = viewport.window_size() / tick_count as f64;
    if !(interval > 0.0) || !interval.is_finite() {
        return Vec::new();
    }
    let middle = (viewport.current_time / interval).round() * interval;
    let reach = tick_count as i64 + 1;
    (-reach..=reach)
        .map(|k| middle + k as f64 * interval)
        .filter(|t| *t >= viewport.start_time() && *t <= viewport.end_time())
        .collect()
}

/// `mm:ss`, with fractional seconds only when ticks are under a second apart.
pub fn format_tick_label(time: f64, interval: f64) -> String {
    let decimals: u32 = if interval > 0.0 && interval < 1.0 {
        ((-interval.log10()).ceil() as u32).clamp(1, 3)
    } else {
        0
    };
    let scale = 10u64.pow(decimals);
    let units = (time.abs() * scale as f64).round() as u64;
    let sign = if time < 0.0 && units > 0 { "-" } else { "" };
    let whole = units / scale;
    let minutes = whole / 60;
    let seconds = whole % 60;
    if decimals == 0 {
        format!("{sign}{minutes:02}:{seconds:02}")
    } else {
        let fraction = units % scale;
        format!(
            "{sign}{minutes:02}:{seconds:02}.{fraction:0width$}",
            width = decimals as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick_label(65.0, 1.0), "01:05");
        assert_eq!(format_tick_label(3.5, 0.5), "00:03.5");
        assert_eq!(format_tick_label(59.99, 0.5), "01:00.0");
        assert_eq!(format_tick_label(-2.0, 1.0), "-00:02");
        assert_eq!(format_tick_label(-0.2, 1.0), "00:00");
        assert_eq!(format_tick_label(1.25, 0.05), "00:01.25");
    }

    #[test]
    fn ticks_snap_to_the_interval() {
        let viewport = Viewport::new(3.3, 5.0);
        let ticks = tick_times(&viewport, 5);
        assert!(ticks.iter().any(|t| (t - 3.0).abs() < 1e-9));
        for t in &ticks {
            assert!((t - t.round()).abs() < 1e-9);
            assert!(*t >= viewport.start_time() && *t <= viewport.end_time());
        }
    }

    #[test]
    fn missing_surface_skips_the_frame() {
        let buffer = SampleBuffer::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let drawn = Renderer::default().render(
            None,
            &buffer,
            &Viewport::default(),
            &AnnotationStore::default(),
        );
        assert!(!drawn);
    }
}
