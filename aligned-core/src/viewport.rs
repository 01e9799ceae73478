//! Time window centred on the playhead and its mapping onto pixel columns.

use crate::samples::SampleBuffer;
use session::ViewportSettings;

/// Optional pinned y bounds. Unpinned axes follow the visible data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl YRange {
    pub fn pinned(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

/// Inclusive range of sample indices inside the time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    pub start: usize,
    pub end: usize,
}

impl IndexWindow {
    pub fn span(&self) -> usize {
        self.end - self.start
    }
}

/// Where the visible samples land horizontally for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLayout {
    pub indices: IndexWindow,
    /// Pixel x of the first visible sample.
    pub start_x: f64,
    /// Pixel x of the last visible sample.
    pub end_x: f64,
    pub stride: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub current_time: f64,
    window_size: f64,
    pub y_range: YRange,
    min_window: f64,
    max_window: f64,
    zoom_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_settings(&ViewportSettings::default())
    }
}

impl Viewport {
    pub fn new(current_time: f64, window_size: f64) -> Self {
        let mut viewport = Self {
            current_time,
            ..Self::default()
        };
        viewport.set_window_size(window_size);
        viewport
    }

    pub fn from_settings(settings: &ViewportSettings) -> Self {
        let min_window = if settings.min_window_s > 0.0 {
            settings.min_window_s
        } else {
            0.1
        };
        let max_window = settings.max_window_s.max(min_window);
        let zoom_factor = if settings.zoom_factor > 1.0 {
            settings.zoom_factor
        } else {
            1.5
        };
        let mut viewport = Self {
            current_time: 0.0,
            window_size: 5.0,
            y_range: YRange {
                min: settings.y_min,
                max: settings.y_max,
            },
            min_window,
            max_window,
            zoom_factor,
        };
        viewport.set_window_size(settings.window_size_s);
        viewport
    }

    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Non-positive or non-finite sizes are ignored.
    pub fn set_window_size(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.window_size = seconds.clamp(self.min_window, self.max_window);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_window_size(self.window_size / self.zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.set_window_size(self.window_size * self.zoom_factor);
    }

    pub fn start_time(&self) -> f64 {
        self.current_time - self.window_size / 2.0
    }

    pub fn end_time(&self) -> f64 {
        self.current_time + self.window_size / 2.0
    }

    pub fn time_at_x(&self, x: f64, width: f64) -> f64 {
        if width <= 0.0 {
            return self.current_time;
        }
        self.current_time + self.window_size * (x - width / 2.0) / width
    }

    pub fn x_at_time(&self, time: f64, width: f64) -> f64 {
        (time - self.current_time) / self.window_size * width + width / 2.0
    }

    /// First sample at or after the window start through the last sample at or
    /// before the window end. `None` when no sample falls inside the window.
    pub fn index_window(&self, times: &[f64]) -> Option<IndexWindow> {
        let start_time = self.start_time();
        let end_time = self.end_time();
        let start = times.partition_point(|&t| t < start_time);
        let after_end = times.partition_point(|&t| t <= end_time);
        if start >= times.len() || after_end == 0 || start >= after_end {
            return None;
        }
        Some(IndexWindow {
            start,
            end: after_end - 1,
        })
    }

    pub fn layout(&self, times: &[f64], width: f64) -> Option<WindowLayout> {
        let indices = self.index_window(times)?;
        let start_x = self.x_at_time(times[indices.start], width).max(0.0);
        let end_x = self.x_at_time(times[indices.end], width);
        Some(WindowLayout {
            indices,
            start_x,
            end_x,
            stride: decimation_stride(indices, width),
        })
    }

    /// Resolves the y bounds for the visible slice, each axis independently.
    pub fn y_bounds(&self, buffer: &SampleBuffer) -> (f64, f64) {
        if let (Some(min), Some(max)) = (self.y_range.min, self.y_range.max) {
            return (min, max);
        }
        let visible = self
            .index_window(buffer.times())
            .and_then(|window| data_bounds(buffer, window));
        let (data_min, data_max) = visible.unwrap_or((-1.0, 1.0));
        (
            self.y_range.min.unwrap_or(data_min),
            self.y_range.max.unwrap_or(data_max),
        )
    }
}

/// Plot every `stride`-th sample once the visible range outgrows the pixel width.
pub fn decimation_stride(window: IndexWindow, width: f64) -> usize {
    let columns = width.floor().max(1.0) as usize;
    (window.span() / columns).max(1)
}

/// Indices to plot: the strided walk from `start` that always ends on `end`,
/// padded with one neighbour on each side when the buffer has one.
pub fn decimated_indices(window: IndexWindow, stride: usize, len: usize) -> Vec<usize> {
    let stride = stride.max(1);
    let mut indices = Vec::with_capacity(window.span() / stride + 4);
    if window.start > 0 {
        indices.push(window.start - 1);
    }
    let mut i = window.start;
    while i < window.end {
        indices.push(i);
        i += stride;
    }
    indices.push(window.end);
    if window.end + 1 < len {
        indices.push(window.end + 1);
    }
    indices
}

fn data_bounds(buffer: &SampleBuffer, window: IndexWindow) -> Option<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = None;
    for channel in buffer.channels() {
        for &value in &channel[window.start..=window.end] {
            if !value.is_finite() {
                continue;
            }
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
        }
    }
    bounds
}

/// Maps a value into canvas y. A zero or inverted range yields mid-height.
pub fn y_to_px(value: f64, min: f64, max: f64, height: f64) -> f64 {
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() || !value.is_finite() {
        return height / 2.0;
    }
    height - height * (value - min) / range
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn window_bounds_hold_for_any_playhead() {
        let times: Vec<f64> = (0..200).map(|i| i as f64 * 0.37).collect();
        for step in 0..400 {
            let current = step as f64 * 0.2 - 5.0;
            for window_size in [0.5, 1.0, 3.3, 20.0] {
                let viewport = Viewport::new(current, window_size);
                let Some(window) = viewport.index_window(&times) else {
                    continue;
                };
                assert!(window.start == 0 || times[window.start] >= viewport.start_time());
                assert!(window.end == times.len() - 1 || times[window.end] <= viewport.end_time());
                assert!(window.start <= window.end);
            }
        }
    }

    #[test]
    fn window_outside_the_data_is_empty() {
        let times = times(6);
        assert_eq!(Viewport::new(-10.0, 2.0).index_window(&times), None);
        assert_eq!(Viewport::new(20.0, 2.0).index_window(&times), None);
        assert_eq!(Viewport::new(2.5, 0.5).index_window(&times), None);
    }

    #[test]
    fn window_at_the_tail_falls_back_to_the_last_index() {
        let times = times(6);
        let window = Viewport::new(5.0, 4.0).index_window(&times).unwrap();
        assert_eq!(window, IndexWindow { start: 3, end: 5 });
    }

    #[test]
    fn stride_is_never_zero_and_walk_keeps_boundaries() {
        for (start, end, width) in [(0, 0, 100.0), (3, 9, 100.0), (0, 10_000, 640.0), (5, 1234, 1.0)] {
            let window = IndexWindow { start, end };
            let stride = decimation_stride(window, width);
            assert!(stride >= 1);
            let walk = decimated_indices(window, stride, end + 1);
            assert!(walk.contains(&start));
            assert!(walk.contains(&end));
            assert!(walk.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn walk_is_padded_on_both_sides() {
        let walk = decimated_indices(IndexWindow { start: 2, end: 4 }, 1, 10);
        assert_eq!(walk, vec![1, 2, 3, 4, 5]);
        let walk = decimated_indices(IndexWindow { start: 0, end: 9 }, 1, 10);
        assert_eq!(walk.first(), Some(&0));
        assert_eq!(walk.last(), Some(&9));
    }

    #[test]
    fn pixel_time_mapping_round_trips() {
        let viewport = Viewport::new(10.0, 4.0);
        assert_eq!(viewport.time_at_x(400.0, 800.0), 10.0);
        assert_eq!(viewport.time_at_x(0.0, 800.0), 8.0);
        assert_eq!(viewport.x_at_time(12.0, 800.0), 800.0);
        let t = viewport.time_at_x(123.0, 800.0);
        assert!((viewport.x_at_time(t, 800.0) - 123.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::new(0.0, 0.2);
        viewport.zoom_in();
        viewport.zoom_in();
        assert_eq!(viewport.window_size(), 0.1);
        viewport.set_window_size(1e9);
        assert_eq!(viewport.window_size(), 600.0);
        viewport.set_window_size(-1.0);
        assert_eq!(viewport.window_size(), 600.0);
    }

    #[test]
    fn y_bounds_follow_visible_data_per_axis() {
        let buffer = SampleBuffer::new(
            times(6),
            vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 5.0, 2.0, 2.0, 2.0, 5.0, 5.0],
        )
        .unwrap();
        let mut viewport = Viewport::new(2.0, 2.0);
        assert_eq!(viewport.y_bounds(&buffer), (-1.0, 2.0));
        viewport.y_range.max = Some(10.0);
        assert_eq!(viewport.y_bounds(&buffer), (-1.0, 10.0));
        viewport.y_range = YRange::pinned(-3.0, 3.0);
        assert_eq!(viewport.y_bounds(&buffer), (-3.0, 3.0));

        let empty = Viewport::new(100.0, 2.0);
        assert_eq!(empty.y_bounds(&buffer), (-1.0, 1.0));
    }

    #[test]
    fn degenerate_range_maps_to_mid_height() {
        assert_eq!(y_to_px(4.0, 4.0, 4.0, 200.0), 100.0);
        assert_eq!(y_to_px(1.0, 0.0, 1.0, 200.0), 0.0);
        assert_eq!(y_to_px(0.0, 0.0, 1.0, 200.0), 200.0);
    }
}
