//! The time-series widget: a scrolling multi-channel plot with editable
//! annotation bands, following the shared playback clock.

use crate::annotations::{annotations_from_value, AnnotationStore, HitTarget};
use crate::clock::{ClockEvent, ClockSync};
use crate::interaction::{Gesture, InteractionController};
use crate::keys;
use crate::palette::{legend_entries, LegendEntry};
use crate::render::{Canvas, Renderer};
use crate::samples::SampleBuffer;
use crate::scheduler::{FrameLoop, FrameScheduler};
use crate::tags::TagRegistry;
use crate::viewport::{Viewport, YRange};
use crate::WidgetError;
use binding::HostBinding;
use session::{Annotation, ViewerSettings};

pub struct TimeseriesWidget<B: HostBinding> {
    binding: B,
    frames: FrameLoop,
    buffer: SampleBuffer,
    viewport: Viewport,
    clock: ClockSync,
    annotations: AnnotationStore,
    controller: InteractionController,
    renderer: Renderer,
    title: String,
    legend: Vec<LegendEntry>,
    /// Remote annotation list received while a gesture was in progress.
    stashed: Option<Vec<Annotation>>,
    canvas_size: (f64, f64),
}

impl<B: HostBinding> TimeseriesWidget<B> {
    /// Decodes the samples once and mirrors the clock and annotation state.
    pub fn new(
        binding: B,
        scheduler: Box<dyn FrameScheduler>,
        settings: &ViewerSettings,
    ) -> Result<Self, WidgetError> {
        let times = keys::required_f64_array(&binding, keys::TIMES)?;
        let values = keys::required_f64_array(&binding, keys::VALUES)?;
        let buffer = SampleBuffer::new(times, values)?;

        let names = binding
            .read(keys::CHANNEL_NAMES)
            .map(|v| keys::string_array(&v))
            .unwrap_or_default();
        let renderer = Renderer::from_settings(settings);
        let legend = legend_entries(&names, buffer.channel_count(), &renderer.palette);
        let title = keys::read_string(&binding, keys::TITLE);

        let tags = binding
            .read(keys::TAGS)
            .map(|v| TagRegistry::from_value(&v))
            .unwrap_or_default();
        let stored = binding
            .read(keys::ANNOTATIONS)
            .map(|v| annotations_from_value(&v))
            .transpose()?
            .unwrap_or_default();
        let annotations =
            AnnotationStore::new(stored, tags, settings.annotations.default_width_s);

        let clock = ClockSync::from_binding(&binding, buffer.duration());
        let mut viewport = Viewport::from_settings(&settings.viewport);
        viewport.current_time = clock.current_time();

        log::debug!(
            "timeseries '{title}': {} channels x {} samples",
            buffer.channel_count(),
            buffer.len()
        );

        Ok(Self {
            binding,
            frames: FrameLoop::new(scheduler),
            buffer,
            viewport,
            clock,
            annotations,
            controller: InteractionController::from_settings(&settings.annotations),
            renderer,
            title,
            legend,
            stashed: None,
            canvas_size: (0.0, f64::from(settings.viewport.canvas_height)),
        })
    }

    /// Subscribes to the shared keys and schedules the first frame.
    pub fn render(&mut self) -> Result<(), WidgetError> {
        if self.frames.is_running() {
            return Ok(());
        }
        ClockSync::subscribe(&mut self.binding)?;
        self.binding.subscribe(keys::ANNOTATIONS)?;
        self.binding.subscribe(keys::TAGS)?;
        self.frames.start();
        Ok(())
    }

    /// Cancels the outstanding frame and drops every subscription.
    pub fn destroy(&mut self) -> Result<(), WidgetError> {
        self.frames.stop();
        self.binding.unsubscribe_all()?;
        Ok(())
    }

    /// Runs one scheduled frame. Returns whether anything was drawn. Frames
    /// arriving after [`TimeseriesWidget::destroy`] are ignored.
    pub fn frame(
        &mut self,
        timestamp_ms: f64,
        canvas: Option<&mut dyn Canvas>,
    ) -> Result<bool, WidgetError> {
        let Some(delta) = self.frames.begin_frame(timestamp_ms) else {
            return Ok(false);
        };
        let result = self.step(delta, canvas);
        self.frames.end_frame();
        result
    }

    fn step(&mut self, delta: f64, canvas: Option<&mut dyn Canvas>) -> Result<bool, WidgetError> {
        self.pump_changes()?;
        if self.clock.advance(delta) {
            self.viewport.current_time = self.clock.current_time();
        }
        Ok(self.redraw(canvas))
    }

    /// Draws the current state without advancing the clock.
    pub fn redraw(&mut self, canvas: Option<&mut dyn Canvas>) -> bool {
        if let Some(canvas) = &canvas {
            let (w, h) = canvas.size();
            self.canvas_size = (f64::from(w), f64::from(h));
        }
        self.renderer
            .render(canvas, &self.buffer, &self.viewport, &self.annotations)
    }

    /// Applies notifications from other instances. Clock changes move the
    /// playhead only; a gesture in progress keeps its own state.
    pub fn pump_changes(&mut self) -> Result<(), WidgetError> {
        for change in self.binding.poll_changes()? {
            if let Some(event) = self.clock.apply_change(&change) {
                if let ClockEvent::Seeked(time) = event {
                    self.viewport.current_time = time;
                }
                continue;
            }
            match change.key.as_str() {
                keys::ANNOTATIONS => match annotations_from_value(&change.value) {
                    Ok(list) if self.controller.is_active() => {
                        log::debug!("annotations changed remotely mid-gesture, deferring");
                        self.stashed = Some(list);
                    }
                    Ok(list) => self.annotations.replace_all(list),
                    Err(err) => log::warn!("ignoring remote annotations: {err}"),
                },
                keys::TAGS => self
                    .annotations
                    .replace_tags(TagRegistry::from_value(&change.value)),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_size = (width, height);
    }

    fn width(&self) -> Option<f64> {
        let width = self.canvas_size.0;
        (width > 0.0).then_some(width)
    }

    pub fn pointer_down(&mut self, x: f64) -> HitTarget {
        let Some(width) = self.width() else {
            return HitTarget::Empty;
        };
        self.controller
            .pointer_down(x, &mut self.annotations, &self.viewport, width)
    }

    pub fn pointer_move(&mut self, x: f64) -> bool {
        let Some(width) = self.width() else {
            return false;
        };
        self.controller
            .pointer_move(x, &mut self.annotations, &self.viewport, width)
    }

    /// Ends the gesture and persists it. A remote list that arrived meanwhile
    /// is dropped when this commit supersedes it, applied otherwise.
    pub fn pointer_up(&mut self) -> Result<bool, WidgetError> {
        let committed = self
            .controller
            .pointer_up(&mut self.annotations, &mut self.binding)?;
        self.apply_stash(committed);
        Ok(committed)
    }

    pub fn cancel_gesture(&mut self) -> bool {
        let cancelled = self.controller.cancel(&mut self.annotations);
        self.apply_stash(false);
        cancelled
    }

    fn apply_stash(&mut self, committed: bool) {
        let Some(list) = self.stashed.take() else {
            return;
        };
        if committed {
            log::debug!("local annotation commit supersedes a remote change");
        } else {
            self.annotations.replace_all(list);
        }
    }

    /// Adds an annotation at the playhead. Ignored while a gesture is active.
    pub fn add_annotation(&mut self) -> Result<Option<usize>, WidgetError> {
        if self.controller.is_active() {
            return Ok(None);
        }
        let index = self.annotations.add(self.viewport.current_time);
        self.annotations.commit(&mut self.binding)?;
        Ok(Some(index))
    }

    pub fn delete_selected(&mut self) -> Result<bool, WidgetError> {
        if self.controller.is_active() {
            return Ok(false);
        }
        if self.annotations.delete_selected().is_none() {
            return Ok(false);
        }
        self.annotations.commit(&mut self.binding)?;
        Ok(true)
    }

    pub fn toggle_tag(&mut self, tag: &str) -> Result<Option<bool>, WidgetError> {
        if self.controller.is_active() {
            return Ok(None);
        }
        let toggled = self.annotations.toggle_tag(tag)?;
        if toggled.is_some() {
            self.annotations.commit(&mut self.binding)?;
        }
        Ok(toggled)
    }

    /// Adds a tag to the registry, publishing the registry when it grew.
    pub fn register_tag(&mut self, name: &str) -> Result<usize, WidgetError> {
        let (index, added) = self.annotations.register_tag(name)?;
        if added {
            self.annotations.commit_tags(&mut self.binding)?;
        }
        Ok(index)
    }

    pub fn toggle_play(&mut self) -> Result<bool, WidgetError> {
        self.clock.toggle_running(&mut self.binding)
    }

    pub fn seek(&mut self, time: f64) -> Result<bool, WidgetError> {
        let moved = self.clock.seek(&mut self.binding, time)?;
        self.viewport.current_time = self.clock.current_time();
        Ok(moved)
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn set_y_range(&mut self, range: YRange) {
        self.viewport.y_range = range;
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.annotations.select(index);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn gesture(&self) -> Gesture {
        self.controller.gesture()
    }

    pub fn is_rendering(&self) -> bool {
        self.frames.is_running()
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }
}
