use crate::canvas::{color32, EguiCanvas};
use crate::export::{export_view, ExportFormat, ExportView};
use crate::scheduler::EguiScheduler;
use crate::GuiError;
use aligned_core::{
    keys, seed_store, snapshot_session, validate_video_path, Canvas, Color, TimeseriesWidget,
    TransportWidget, VideoCommand, VideoSync, WidgetError, YRange,
};
use binding::{ModelHandle, SharedStore, Value};
use eframe::egui;
use session::{SessionDefinition, ViewerSettings};
use std::fmt::Display;
use std::path::{Path, PathBuf};

const EXPORT_SIZE: (u32, u32) = (1600, 600);

fn report<T, E: Display>(status: &mut String, what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!("{what}: {err}");
            *status = format!("{what}: {err}");
            None
        }
    }
}

struct ViewPanel {
    widget: TimeseriesWidget<ModelHandle>,
    scheduler: EguiScheduler,
    canvas_height: f32,
    pointer_held: bool,
    new_tag: String,
    y_min: String,
    y_max: String,
}

impl ViewPanel {
    fn new(
        store: &SharedStore,
        settings: &ViewerSettings,
    ) -> Result<Self, GuiError> {
        let scheduler = EguiScheduler::new();
        let mut widget = TimeseriesWidget::new(
            store.connect()?,
            Box::new(scheduler.clone()),
            settings,
        )?;
        widget.render()?;
        let pinned = widget.viewport().y_range;
        Ok(Self {
            widget,
            scheduler,
            canvas_height: settings.viewport.canvas_height,
            pointer_held: false,
            new_tag: String::new(),
            y_min: pinned.min.map(|v| v.to_string()).unwrap_or_default(),
            y_max: pinned.max.map(|v| v.to_string()).unwrap_or_default(),
        })
    }

    /// Returns whether the pointer interacted with this view.
    fn ui(&mut self, ui: &mut egui::Ui, now_ms: f64, status: &mut String) -> bool {
        ui.heading(self.widget.title().to_string());
        ui.horizontal_wrapped(|ui| {
            for entry in self.widget.legend() {
                ui.colored_label(
                    color32(Color::from(entry.color)),
                    format!("\u{25A0} {}", entry.name),
                );
            }
        });
        self.toolbar_ui(ui, status);
        self.tags_ui(ui, status);

        let size = egui::vec2(ui.available_width(), self.canvas_height);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let rect = response.rect;
        self.widget
            .set_canvas_size(f64::from(rect.width()), f64::from(rect.height()));
        let touched = self.pointer_ui(ui, &response, rect, status);

        let mut canvas = EguiCanvas::new(&painter, rect);
        let canvas: &mut dyn Canvas = &mut canvas;
        if self.scheduler.take_due().is_some() {
            report(status, "frame", self.widget.frame(now_ms, Some(canvas)));
        } else {
            self.widget.redraw(Some(canvas));
        }
        touched
    }

    fn toolbar_ui(&mut self, ui: &mut egui::Ui, status: &mut String) {
        ui.horizontal(|ui| {
            if ui.button("Add").on_hover_text("Add annotation at the playhead (A)").clicked() {
                report(status, "add annotation", self.widget.add_annotation());
            }
            let has_selection = self.widget.annotations().selected().is_some();
            if ui
                .add_enabled(has_selection, egui::Button::new("Delete"))
                .clicked()
            {
                report(status, "delete annotation", self.widget.delete_selected());
            }
            ui.separator();
            if ui.button("-").on_hover_text("Zoom out").clicked() {
                self.widget.zoom_out();
            }
            ui.label(format!("{:.2} s", self.widget.viewport().window_size()));
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.widget.zoom_in();
            }
            ui.separator();
            ui.label("y");
            ui.add(egui::TextEdit::singleline(&mut self.y_min).desired_width(48.0));
            ui.add(egui::TextEdit::singleline(&mut self.y_max).desired_width(48.0));
            if ui.button("Pin").clicked() {
                self.pin_y_range(status);
            }
            if ui.button("Auto").clicked() {
                self.y_min.clear();
                self.y_max.clear();
                self.widget.set_y_range(YRange::default());
            }
            ui.separator();
            for format in [ExportFormat::Png, ExportFormat::Svg] {
                let label = format!("Export {}", format.extension().to_uppercase());
                if ui.button(label).clicked() {
                    self.export(format, status);
                }
            }
        });
    }

    fn tags_ui(&mut self, ui: &mut egui::Ui, status: &mut String) {
        let selected = self.widget.annotations().selected_annotation().cloned();
        let names = self.widget.annotations().tags().names().to_vec();
        let mut toggle = None;
        ui.horizontal_wrapped(|ui| {
            ui.label("Tags:");
            for (idx, name) in names.iter().enumerate() {
                let color = color32(Color::from(self.widget.renderer().palette.tag_color(idx)));
                let active = selected.as_ref().is_some_and(|a| a.has_tag(name));
                let text = egui::RichText::new(name.as_str()).color(color);
                let response = ui.add_enabled(
                    selected.is_some(),
                    egui::SelectableLabel::new(active, text),
                );
                if response.clicked() {
                    toggle = Some(name.clone());
                }
            }
            ui.add(
                egui::TextEdit::singleline(&mut self.new_tag)
                    .hint_text("new tag")
                    .desired_width(96.0),
            );
            if ui.button("Add tag").clicked() {
                let name = self.new_tag.trim().to_string();
                if report(status, "register tag", self.widget.register_tag(&name)).is_some() {
                    self.new_tag.clear();
                }
            }
        });
        if let Some(tag) = toggle {
            report(status, "toggle tag", self.widget.toggle_tag(&tag));
        }
    }

    fn pointer_ui(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: egui::Rect,
        status: &mut String,
    ) -> bool {
        let (pressed, released, down, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
            )
        });
        let x = pos.map(|p| f64::from(p.x - rect.min.x));
        let mut touched = false;

        if pressed && response.hovered() {
            if let Some(x) = x {
                self.pointer_held = true;
                touched = true;
                let target = self.widget.pointer_down(x);
                log::debug!("pointer down at {x:.1}px: {target:?}");
            }
        } else if self.pointer_held && down {
            if let Some(x) = x {
                self.widget.pointer_move(x);
            }
        }
        if self.pointer_held && released {
            self.pointer_held = false;
            touched = true;
            report(status, "commit annotation", self.widget.pointer_up());
        }
        if self.widget.gesture().index().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
        }
        touched
    }

    fn pin_y_range(&mut self, status: &mut String) {
        let parse = |text: &str| -> Result<Option<f64>, String> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| format!("'{text}' is not a number"))
        };
        let range = parse(&self.y_min).and_then(|min| {
            let max = parse(&self.y_max)?;
            match (min, max) {
                (Some(lo), Some(hi)) if lo >= hi => Err(format!("{lo} is not below {hi}")),
                _ => Ok(YRange { min, max }),
            }
        });
        if let Some(range) = report(status, "y range", range) {
            self.widget.set_y_range(range);
        }
    }

    fn export(&mut self, format: ExportFormat, status: &mut String) {
        let ext = format.extension();
        let Some(path) = rfd::FileDialog::new()
            .add_filter(ext.to_uppercase(), &[ext])
            .set_file_name(format!("{}.{ext}", file_stem(self.widget.title())))
            .save_file()
        else {
            return;
        };
        let view = ExportView {
            title: self.widget.title(),
            buffer: self.widget.buffer(),
            viewport: self.widget.viewport(),
            annotations: self.widget.annotations(),
            renderer: self.widget.renderer(),
            legend: self.widget.legend(),
        };
        if report(status, "export", export_view(&path, &view, EXPORT_SIZE)).is_some() {
            *status = format!("Exported {}", path.display());
        }
    }

    fn destroy(&mut self) -> Result<(), WidgetError> {
        self.widget.destroy()
    }
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "plot".to_string()
    } else {
        stem
    }
}

/// Stand-in for a media element: tracks a play state and position and
/// reports them the way a player would.
#[derive(Debug, Default)]
struct ElementState {
    playing: bool,
    position: f64,
    last_ms: Option<f64>,
}

impl ElementState {
    fn advance(&mut self, now_ms: f64) {
        if let Some(last) = self.last_ms {
            if self.playing {
                self.position += ((now_ms - last) / 1000.0).max(0.0);
            }
        }
        self.last_ms = Some(now_ms);
    }

    fn apply(&mut self, command: VideoCommand) {
        match command {
            VideoCommand::Play => self.playing = true,
            VideoCommand::Pause => self.playing = false,
            VideoCommand::SeekTo(time) => self.position = time,
        }
    }
}

struct VideoPanel {
    widget: VideoSync<ModelHandle>,
    scheduler: EguiScheduler,
    element: ElementState,
}

impl VideoPanel {
    fn new(store: &SharedStore, settings: &ViewerSettings) -> Result<Self, GuiError> {
        let scheduler = EguiScheduler::new();
        let mut widget = VideoSync::new(
            store.connect()?,
            Box::new(scheduler.clone()),
            settings.transport.video_drift_tolerance_s,
        )?;
        widget.render()?;
        let element = ElementState {
            position: widget.clock().current_time(),
            ..ElementState::default()
        };
        Ok(Self {
            widget,
            scheduler,
            element,
        })
    }

    fn ui(&mut self, ui: &mut egui::Ui, now_ms: f64, status: &mut String) {
        self.element.advance(now_ms);
        if self.scheduler.take_due().is_some() {
            let commands = self.widget.frame(now_ms, self.element.position);
            for command in report(status, "video sync", commands).unwrap_or_default() {
                log::debug!("video element: {command:?}");
                self.element.apply(command);
            }
        }

        ui.horizontal(|ui| {
            ui.label(format!("Video: {}", self.widget.url()));
            ui.separator();
            let label = if self.element.playing { "Pause video" } else { "Play video" };
            if ui.button(label).clicked() {
                self.element.playing = !self.element.playing;
                let result = if self.element.playing {
                    self.widget.on_native_play()
                } else {
                    self.widget.on_native_pause()
                };
                report(status, "video", result);
            }
            let duration = self.widget.clock().duration().max(0.0);
            let mut position = self.element.position;
            let slider = egui::Slider::new(&mut position, 0.0..=duration)
                .show_value(false)
                .text(aligned_core::format_time(self.element.position));
            if ui.add(slider).changed() {
                self.element.position = position;
                report(status, "video seek", self.widget.on_native_seeked(position));
            }
        });
    }

    fn destroy(&mut self) -> Result<(), WidgetError> {
        self.widget.destroy()
    }
}

/// The desktop viewer: a shared transport bar, an optional video element and
/// one or more time-series views over the same store.
pub struct AlignedApp {
    store: SharedStore,
    session: SessionDefinition,
    session_path: Option<PathBuf>,
    settings: ViewerSettings,
    transport: TransportWidget<ModelHandle>,
    transport_scheduler: EguiScheduler,
    views: Vec<ViewPanel>,
    video: Option<VideoPanel>,
    active_view: usize,
    status: String,
}

impl AlignedApp {
    pub fn new(
        session: SessionDefinition,
        settings: ViewerSettings,
        views: usize,
        session_path: Option<PathBuf>,
    ) -> Result<Self, GuiError> {
        let store = SharedStore::new();
        seed_store(&store, &session)?;

        let transport_scheduler = EguiScheduler::new();
        let mut transport = TransportWidget::new(
            store.connect()?,
            Box::new(transport_scheduler.clone()),
            &settings.transport,
        );
        transport.render()?;

        let views = (0..views.max(1))
            .map(|_| ViewPanel::new(&store, &settings))
            .collect::<Result<Vec<_>, _>>()?;

        let mut status = String::new();
        let video = match &session.video {
            Some(path) => match validate_video_path(path) {
                Ok(_) => Some(VideoPanel::new(&store, &settings)?),
                Err(err) => {
                    log::warn!("video disabled: {err}");
                    status = format!("video disabled: {err}");
                    None
                }
            },
            None => None,
        };

        log::info!(
            "viewer ready: {} view(s), video {}",
            views.len(),
            if video.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            store,
            session,
            session_path,
            settings,
            transport,
            transport_scheduler,
            views,
            video,
            active_view: 0,
            status,
        })
    }

    /// Routes repaint requests from every widget scheduler to `ctx`.
    pub fn attach(&self, ctx: &egui::Context) {
        self.transport_scheduler.attach(ctx);
        for view in &self.views {
            view.scheduler.attach(ctx);
        }
        if let Some(video) = &self.video {
            video.scheduler.attach(ctx);
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    /// The session as edited so far.
    pub fn snapshot(&self) -> SessionDefinition {
        snapshot_session(&self.store, &self.session)
    }

    pub fn save_session(&mut self, path: &Path) -> Result<(), GuiError> {
        let session = self.snapshot();
        session.save_to_file(path)?;
        log::info!("session saved to {}", path.display());
        self.session = session;
        self.session_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Publishes a new video source and brings up the video panel.
    pub fn attach_video(&mut self, path: &Path) -> Result<(), GuiError> {
        let path = validate_video_path(path).map_err(WidgetError::from)?;
        if let Some(video) = &mut self.video {
            video.widget.publish_source(&path)?;
        } else {
            self.store
                .set(keys::VIDEO_URL, Value::from(path.display().to_string()))?;
            self.video = Some(VideoPanel::new(&self.store, &self.settings)?);
        }
        self.session.video = Some(path);
        Ok(())
    }

    /// Tears every widget down: frames cancelled, subscriptions dropped.
    pub fn shutdown(&mut self) {
        report(&mut self.status, "transport", self.transport.destroy());
        for view in &mut self.views {
            report(&mut self.status, "view", view.destroy());
        }
        if let Some(video) = &mut self.video {
            report(&mut self.status, "video", video.destroy());
        }
    }

    fn transport_ui(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        if self.transport_scheduler.take_due().is_some() {
            report(&mut self.status, "transport", self.transport.frame(now_ms));
        }
        ui.horizontal(|ui| {
            if ui.button("\u{23EA}").on_hover_text("Rewind").clicked() {
                report(&mut self.status, "rewind", self.transport.rewind());
            }
            let play = if self.transport.clock().is_running() {
                "\u{23F8}"
            } else {
                "\u{25B6}"
            };
            if ui.button(play).on_hover_text("Play/pause (Space)").clicked() {
                report(&mut self.status, "play", self.transport.toggle_play());
            }
            if ui.button("\u{23E9}").on_hover_text("Forward").clicked() {
                report(&mut self.status, "forward", self.transport.forward());
            }
            ui.label(self.transport.current_label());
            let mut fraction = self.transport.progress();
            let slider = egui::Slider::new(&mut fraction, 0.0..=1.0).show_value(false);
            if ui.add(slider).changed() {
                report(&mut self.status, "seek", self.transport.seek_fraction(fraction));
            }
            ui.label(self.transport.total_label());
            ui.separator();
            if ui.button("Save session").clicked() {
                self.save_clicked();
            }
            if ui.button("Attach video\u{2026}").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("MP4 video", &["mp4"])
                    .pick_file()
                {
                    let result = self.attach_video(&path);
                    report(&mut self.status, "attach video", result);
                }
            }
        });
    }

    fn save_clicked(&mut self) {
        let path = self.session_path.clone().or_else(|| {
            rfd::FileDialog::new()
                .add_filter("Session", &["json"])
                .set_file_name("session.json")
                .save_file()
        });
        let Some(path) = path else {
            return;
        };
        let result = self.save_session(&path);
        if report(&mut self.status, "save session", result).is_some() {
            self.status = format!("Saved {}", path.display());
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (add, delete, zoom_in, zoom_out, play, cancel) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::A),
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if play {
            report(&mut self.status, "play", self.transport.toggle_play());
        }
        let Some(view) = self.views.get_mut(self.active_view) else {
            return;
        };
        if add {
            report(&mut self.status, "add annotation", view.widget.add_annotation());
        }
        if delete {
            report(&mut self.status, "delete annotation", view.widget.delete_selected());
        }
        if zoom_in {
            view.widget.zoom_in();
        }
        if zoom_out {
            view.widget.zoom_out();
        }
        if cancel && view.widget.cancel_gesture() {
            view.pointer_held = false;
        }
    }
}

impl eframe::App for AlignedApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now_ms = ctx.input(|i| i.time) * 1000.0;
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("transport").show(ctx, |ui| self.transport_ui(ui, now_ms));

        if let Some(video) = &mut self.video {
            let status = &mut self.status;
            egui::TopBottomPanel::top("video").show(ctx, |ui| video.ui(ui, now_ms, status));
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.status.as_str());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (idx, view) in self.views.iter_mut().enumerate() {
                    if view.ui(ui, now_ms, &mut self.status) {
                        self.active_view = idx;
                    }
                    ui.separator();
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_state_follows_commands_and_time() {
        let mut element = ElementState::default();
        element.advance(0.0);
        element.apply(VideoCommand::Play);
        element.advance(500.0);
        assert_eq!(element.position, 0.5);
        element.apply(VideoCommand::SeekTo(10.0));
        element.apply(VideoCommand::Pause);
        element.advance(1500.0);
        assert_eq!(element.position, 10.0);
        assert!(!element.playing);
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem("EMG / left"), "EMG___left");
        assert_eq!(file_stem(""), "plot");
    }
}
