use crate::{Rgb, SessionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CHANNEL_COLORS: [Rgb; 6] = [
    Rgb::new(0xF4, 0x43, 0x36),
    Rgb::new(0x4C, 0xAF, 0x50),
    Rgb::new(0x21, 0x96, 0xF3),
    Rgb::new(0xFF, 0xEB, 0x3B),
    Rgb::new(0x79, 0x55, 0x48),
    Rgb::new(0x67, 0x3A, 0xB7),
];

pub const DEFAULT_TAG_COLORS: [Rgb; 8] = [
    Rgb::new(0x00, 0x96, 0x88),
    Rgb::new(0xFF, 0x98, 0x00),
    Rgb::new(0x9C, 0x27, 0xB0),
    Rgb::new(0x03, 0xA9, 0xF4),
    Rgb::new(0x8B, 0xC3, 0x4A),
    Rgb::new(0xE9, 0x1E, 0x63),
    Rgb::new(0x3F, 0x51, 0xB5),
    Rgb::new(0xCD, 0xDC, 0x39),
];

pub const DEFAULT_UNTAGGED_COLOR: Rgb = Rgb::new(0x9E, 0x9E, 0x9E);
pub const DEFAULT_ZERO_LINE_COLOR: Rgb = Rgb::new(0x60, 0x7D, 0x8B);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub window: WindowSettings,
    pub viewport: ViewportSettings,
    pub annotations: AnnotationSettings,
    pub palette: PaletteSettings,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Aligned Widgets".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub window_size_s: f64,
    pub min_window_s: f64,
    pub max_window_s: f64,
    pub zoom_factor: f64,
    pub tick_count: usize,
    pub show_grid: bool,
    pub canvas_height: f32,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            window_size_s: 5.0,
            min_window_s: 0.1,
            max_window_s: 600.0,
            zoom_factor: 1.5,
            tick_count: 5,
            show_grid: true,
            canvas_height: 240.0,
            y_min: None,
            y_max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    pub default_width_s: f64,
    pub handle_tolerance_px: f32,
    pub move_threshold_px: f32,
    pub band_alpha: u8,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            default_width_s: 0.5,
            handle_tolerance_px: 6.0,
            move_threshold_px: 2.0,
            band_alpha: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteSettings {
    pub channels: Vec<Rgb>,
    pub tags: Vec<Rgb>,
    pub untagged: Rgb,
    pub zero_line: Rgb,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNEL_COLORS.to_vec(),
            tags: DEFAULT_TAG_COLORS.to_vec(),
            untagged: DEFAULT_UNTAGGED_COLOR,
            zero_line: DEFAULT_ZERO_LINE_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub skip_seconds: f64,
    pub video_drift_tolerance_s: f64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            skip_seconds: 5.0,
            video_drift_tolerance_s: 0.25,
        }
    }
}

impl ViewerSettings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        let settings: ViewerSettings = toml::from_str(&text)?;
        settings.validate()?;
        Ok(settings.normalized())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if let (Some(min), Some(max)) = (self.viewport.y_min, self.viewport.y_max) {
            if min >= max {
                return Err(SessionError::Validation(format!(
                    "viewport.y_min ({min}) must be below viewport.y_max ({max})"
                )));
            }
        }
        if self.viewport.min_window_s > self.viewport.max_window_s {
            return Err(SessionError::Validation(
                "viewport.min_window_s exceeds viewport.max_window_s".to_string(),
            ));
        }
        Ok(())
    }

    /// Replaces out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        let defaults = ViewportSettings::default();
        let viewport = &mut self.viewport;
        if !(viewport.min_window_s > 0.0) {
            viewport.min_window_s = defaults.min_window_s;
        }
        if !(viewport.max_window_s >= viewport.min_window_s) {
            viewport.max_window_s = viewport.min_window_s.max(defaults.max_window_s);
        }
        if !(viewport.window_size_s > 0.0) {
            viewport.window_size_s = defaults.window_size_s;
        }
        viewport.window_size_s = viewport
            .window_size_s
            .clamp(viewport.min_window_s, viewport.max_window_s);
        if !(viewport.zoom_factor > 1.0) {
            viewport.zoom_factor = defaults.zoom_factor;
        }
        viewport.tick_count = viewport.tick_count.max(1);
        if !(viewport.canvas_height > 0.0) {
            viewport.canvas_height = defaults.canvas_height;
        }

        let annotations = &mut self.annotations;
        if !(annotations.default_width_s > 0.0) {
            annotations.default_width_s = AnnotationSettings::default().default_width_s;
        }
        annotations.handle_tolerance_px = annotations.handle_tolerance_px.max(0.0);
        annotations.move_threshold_px = annotations.move_threshold_px.max(0.0);

        if self.palette.channels.is_empty() {
            self.palette.channels = DEFAULT_CHANNEL_COLORS.to_vec();
        }
        if self.palette.tags.is_empty() {
            self.palette.tags = DEFAULT_TAG_COLORS.to_vec();
        }

        self.transport.skip_seconds = self.transport.skip_seconds.abs();
        self.transport.video_drift_tolerance_s = self.transport.video_drift_tolerance_s.max(0.0);
        self
    }
}
