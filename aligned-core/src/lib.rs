//! Windowed time-series rendering and interval annotation editing, kept in step
//! with sibling widgets through a shared playback clock.
//!
//! Every widget talks to the outside world through a [`binding::HostBinding`],
//! draws onto a [`Canvas`] and is driven by a [`FrameScheduler`], so the whole
//! engine runs headless in tests.

pub mod annotations;
pub mod clock;
pub mod host;
pub mod interaction;
pub mod keys;
pub mod palette;
pub mod render;
pub mod samples;
pub mod scheduler;
pub mod tags;
pub mod timeseries;
pub mod transport;
pub mod video;
pub mod viewport;

pub use annotations::{AnnotationError, AnnotationStore, HitTarget, Side, VisibleAnnotation};
pub use clock::{ClockEvent, ClockSync, FrameClock};
pub use host::{seed_store, snapshot_session};
pub use interaction::{Edge, Gesture, InteractionController};
pub use palette::{legend_entries, LegendEntry, Palette};
pub use render::{
    build_polyline, format_tick_label, tick_times, Canvas, Color, DrawCommand, Point,
    RecordingCanvas, Renderer, Stroke,
};
pub use samples::{SampleBuffer, SampleError};
pub use scheduler::{FrameLoop, FrameRequest, FrameScheduler, ManualScheduler};
pub use tags::TagRegistry;
pub use timeseries::TimeseriesWidget;
pub use transport::{format_time, TransportWidget};
pub use video::{validate_video_path, VideoCommand, VideoError, VideoSync};
pub use viewport::{
    decimated_indices, decimation_stride, y_to_px, IndexWindow, Viewport, WindowLayout, YRange,
};

use binding::BindingError;
use session::SessionError;

#[derive(thiserror::Error, Debug)]
pub enum WidgetError {
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),
    #[error("sample error: {0}")]
    Samples(#[from] SampleError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("video error: {0}")]
    Video(#[from] VideoError),
    #[error("annotation error: {0}")]
    Annotation(#[from] AnnotationError),
    #[error("missing key '{0}'")]
    MissingKey(&'static str),
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
