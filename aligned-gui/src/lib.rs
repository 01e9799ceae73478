use aligned_core::WidgetError;
use binding::BindingError;
use eframe::egui;
use session::{SessionDefinition, SessionError, ViewerSettings, WindowSettings};
use std::path::PathBuf;

mod app;
mod canvas;
mod export;
mod scheduler;

pub use app::AlignedApp;
pub use canvas::EguiCanvas;
pub use export::{export_view, ExportFormat, ExportView};
pub use scheduler::EguiScheduler;

#[derive(Debug, Clone)]
pub struct GuiConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
    /// Number of time-series views over the same session.
    pub views: usize,
    /// Where "Save session" writes.
    pub session_path: Option<PathBuf>,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            title: "Aligned Widgets".to_string(),
            width: 1280.0,
            height: 720.0,
            views: 1,
            session_path: None,
        }
    }
}

impl From<&WindowSettings> for GuiConfig {
    fn from(window: &WindowSettings) -> Self {
        Self {
            title: window.title.clone(),
            width: window.width,
            height: window.height,
            ..Self::default()
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GuiError {
    #[error("gui error: {0}")]
    Gui(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn run_gui(
    config: GuiConfig,
    session: SessionDefinition,
    settings: ViewerSettings,
) -> Result<(), GuiError> {
    let app = AlignedApp::new(session, settings, config.views, config.session_path.clone())?;

    let mut options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([config.width, config.height]),
        ..Default::default()
    };
    // NOTE: Vsync generates hangs and lag on occluded windows.
    options.vsync = false;

    eframe::run_native(
        &config.title,
        options,
        Box::new(move |cc| {
            app.attach(&cc.egui_ctx);
            Box::new(app)
        }),
    )
    .map_err(|err| GuiError::Gui(err.to_string()))
}
