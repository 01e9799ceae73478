use crate::commands::Commands;
use crate::output::*;
use aligned_core::{
    decimation_stride, legend_entries, AnnotationStore, Palette, SampleBuffer, TagRegistry,
    Viewport,
};
use aligned_gui::{run_gui, GuiConfig};
use session::{read_f64_file, SessionDefinition, ViewerSettings};
use std::path::{Path, PathBuf};

pub fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::View {
            session,
            config,
            views,
        } => handle_view(&session, config.as_deref(), views)?,
        Commands::Inspect {
            session,
            at,
            window,
            width,
            config,
            json_query,
        } => handle_inspect(&session, config.as_deref(), at, window, width, json_query)?,
        Commands::Import {
            times,
            values,
            title,
            channels,
            video,
            out,
        } => handle_import(&times, &values, title, channels, video, &out)?,
        Commands::Config { write } => {
            ViewerSettings::default().save_to_file(&write)?;
            print_info(&format!("Default settings written to {}", write.display()));
        }
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<ViewerSettings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let settings = ViewerSettings::load_from_file(path)?;
            log::info!("settings loaded from {}", path.display());
            Ok(settings)
        }
        None => Ok(ViewerSettings::default()),
    }
}

fn handle_view(
    path: &Path,
    config: Option<&Path>,
    views: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(config)?;
    let session = SessionDefinition::load_from_file(path)?;
    let gui = GuiConfig {
        views,
        session_path: Some(path.to_path_buf()),
        ..GuiConfig::from(&settings.window)
    };
    run_gui(gui, session, settings)?;
    Ok(())
}

fn handle_inspect(
    path: &Path,
    config: Option<&Path>,
    at: f64,
    window: Option<f64>,
    width: f64,
    json_query: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(config)?;
    let session = SessionDefinition::load_from_file(path)?;
    let buffer = SampleBuffer::new(session.times.clone(), session.values.clone())?;

    let mut viewport = Viewport::from_settings(&settings.viewport);
    viewport.current_time = at;
    if let Some(window) = window {
        viewport.set_window_size(window);
    }

    let palette = Palette::from_settings(&settings.palette);
    let channels: Vec<String> =
        legend_entries(&session.channel_names, buffer.channel_count(), &palette)
            .into_iter()
            .map(|entry| entry.name)
            .collect();
    let indices = viewport.index_window(buffer.times());
    let store = AnnotationStore::new(
        session.annotations.clone(),
        TagRegistry::new(session.tags.iter().cloned()),
        settings.annotations.default_width_s,
    );
    let annotations = store
        .visible_in(&viewport, width)
        .into_iter()
        .filter_map(|band| Some((band.index, session.annotations.get(band.index)?)))
        .collect();

    let report = FrameReport {
        title: &session.title,
        channels: &channels,
        samples: buffer.len(),
        duration: buffer.duration(),
        start: viewport.start_time(),
        end: viewport.end_time(),
        window: indices,
        stride: indices.map(|w| decimation_stride(w, width)).unwrap_or(1),
        y_bounds: viewport.y_bounds(&buffer),
        annotations,
    };
    if json_query {
        print_frame_json(&report);
    } else {
        print_frame_report(&report);
    }
    Ok(())
}

fn handle_import(
    times: &Path,
    values: &Path,
    title: String,
    channels: Vec<String>,
    video: Option<PathBuf>,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let times = read_f64_file(times)?;
    let values = read_f64_file(values)?;
    let buffer = SampleBuffer::new(times.clone(), values.clone())?;
    if !channels.is_empty() && channels.len() != buffer.channel_count() {
        return Err(format!(
            "{} channel names given for {} channels",
            channels.len(),
            buffer.channel_count()
        )
        .into());
    }

    let mut session = SessionDefinition::new(title, times, values);
    session.channel_names = channels;
    session.video = video;
    session.save_to_file(out)?;
    print_info(&format!(
        "Imported {} channels x {} samples into {}",
        buffer.channel_count(),
        buffer.len(),
        out.display()
    ));
    Ok(())
}
