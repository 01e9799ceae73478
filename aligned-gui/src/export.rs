//! Still-image export of the visible window.

use crate::GuiError;
use aligned_core::{AnnotationStore, LegendEntry, Renderer, SampleBuffer, Viewport};
use plotters::backend::SVGBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use session::Rgb;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// What one time-series view shows right now.
pub struct ExportView<'a> {
    pub title: &'a str,
    pub buffer: &'a SampleBuffer,
    pub viewport: &'a Viewport,
    pub annotations: &'a AnnotationStore,
    pub renderer: &'a Renderer,
    pub legend: &'a [LegendEntry],
}

pub fn export_view(
    path: &Path,
    view: &ExportView<'_>,
    size: (u32, u32),
) -> Result<(), GuiError> {
    let format = ExportFormat::from_path(path).ok_or_else(|| {
        GuiError::Export(format!("unsupported export format: {}", path.display()))
    })?;
    let result = match format {
        ExportFormat::Png => draw_view(BitMapBackend::new(path, size).into_drawing_area(), view),
        ExportFormat::Svg => draw_view(SVGBackend::new(path, size).into_drawing_area(), view),
    };
    result.map_err(GuiError::Export)?;
    log::info!("exported '{}' to {}", view.title, path.display());
    Ok(())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn draw_view<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    view: &ExportView<'_>,
) -> Result<(), String> {
    let start = view.viewport.start_time();
    let end = view.viewport.end_time();
    let (y_min, y_max) = match view.viewport.y_bounds(view.buffer) {
        (lo, hi) if hi > lo => (lo, hi),
        (lo, hi) => (lo.min(hi) - 1.0, lo.max(hi) + 1.0),
    };
    let times = view.buffer.times();
    let text_color = RGBColor(220, 220, 220);
    let axis_color = RGBColor(80, 80, 80);

    root.fill(&RGBColor(24, 24, 24)).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(view.title, ("sans-serif", 24).into_font().color(&text_color))
        .set_label_area_size(LabelAreaPosition::Left, 40)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(start..end, y_min..y_max)
        .map_err(|e| e.to_string())?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("time (s)")
        .label_style(("sans-serif", 14).into_font().color(&text_color))
        .axis_style(&axis_color);
    if view.renderer.show_grid {
        mesh.light_line_style(&axis_color).bold_line_style(&axis_color);
    } else {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(|e| e.to_string())?;

    let palette = &view.renderer.palette;
    let alpha = f64::from(view.renderer.band_alpha) / 255.0;
    let bands = view
        .annotations
        .annotations()
        .iter()
        .filter(|a| a.overlaps(start, end))
        .map(|a| {
            let color = view
                .annotations
                .color_index(a)
                .map(|idx| palette.tag_color(idx))
                .unwrap_or(palette.untagged);
            let x0 = a.lower().max(start);
            let x1 = a.upper().min(end);
            Rectangle::new([(x0, y_min), (x1, y_max)], rgb(color).mix(alpha).filled())
        });
    chart.draw_series(bands).map_err(|e| e.to_string())?;

    for (idx, values) in view.buffer.channels().enumerate() {
        let color = rgb(palette.channel_color(idx));
        let data: Vec<(f64, f64)> = times
            .iter()
            .zip(values)
            .filter(|(t, _)| **t >= start && **t <= end)
            .map(|(t, v)| (*t, *v))
            .collect();
        let name = view
            .legend
            .get(idx)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| format!("ch{idx}"));
        chart
            .draw_series(LineSeries::new(data, color.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(RGBColor(18, 18, 18))
        .border_style(axis_color)
        .label_font(("sans-serif", 16).into_font().color(&text_color))
        .position(SeriesLabelPosition::UpperRight)
        .margin(12)
        .draw()
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_comes_from_the_extension() {
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("plot.PNG")),
            Some(ExportFormat::Png)
        );
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("out/plot.svg")),
            Some(ExportFormat::Svg)
        );
        assert_eq!(ExportFormat::from_path(&PathBuf::from("plot.jpg")), None);
        assert_eq!(ExportFormat::from_path(&PathBuf::from("plot")), None);
    }

    #[test]
    fn unsupported_extension_is_an_export_error() {
        let buffer = SampleBuffer::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let viewport = Viewport::new(0.5, 1.0);
        let annotations = AnnotationStore::new(Vec::new(), Default::default(), 0.5);
        let renderer = Renderer::default();
        let view = ExportView {
            title: "t",
            buffer: &buffer,
            viewport: &viewport,
            annotations: &annotations,
            renderer: &renderer,
            legend: &[],
        };
        let err = export_view(Path::new("plot.gif"), &view, (200, 100)).unwrap_err();
        assert!(matches!(err, GuiError::Export(_)));
    }
}
