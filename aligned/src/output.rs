use aligned_core::{format_tick_label, IndexWindow};
use session::Annotation;

pub fn print_info(message: &str) {
    println!("[Aligned][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[Aligned][ERROR]: {message}");
}

pub struct FrameReport<'a> {
    pub title: &'a str,
    pub channels: &'a [String],
    pub samples: usize,
    pub duration: f64,
    pub start: f64,
    pub end: f64,
    pub window: Option<IndexWindow>,
    pub stride: usize,
    pub y_bounds: (f64, f64),
    pub annotations: Vec<(usize, &'a Annotation)>,
}

pub fn print_frame_report(report: &FrameReport<'_>) {
    let title = if report.title.is_empty() {
        "(untitled)"
    } else {
        report.title
    };
    print_info(title);
    println!("Channels: {}", report.channels.len());
    for name in report.channels {
        println!("\t{name}");
    }
    println!("Samples: {}", report.samples);
    println!("Duration: {:.3} s", report.duration);
    println!("Window: {:.3} s .. {:.3} s", report.start, report.end);
    match report.window {
        Some(window) => println!(
            "Indices: {}..={} (stride {})",
            window.start, window.end, report.stride
        ),
        None => println!("Indices: (none)"),
    }
    println!("Y bounds: {} .. {}", report.y_bounds.0, report.y_bounds.1);
    println!("Annotations:");
    if report.annotations.is_empty() {
        println!("\t(none)");
    }
    for (index, annotation) in &report.annotations {
        let tags: Vec<&str> = annotation.tags.iter().map(String::as_str).collect();
        println!(
            "\t#{index} {} - {} [{}]",
            format_tick_label(annotation.start, 0.1),
            format_tick_label(annotation.end, 0.1),
            tags.join(", ")
        );
    }
}

pub fn print_frame_json(report: &FrameReport<'_>) {
    let annotations: Vec<serde_json::Value> = report
        .annotations
        .iter()
        .map(|(index, annotation)| {
            serde_json::json!({
                "index": index,
                "start": annotation.start,
                "end": annotation.end,
                "tags": annotation.tags,
            })
        })
        .collect();
    let value = serde_json::json!({
        "title": report.title,
        "channels": report.channels,
        "samples": report.samples,
        "duration": report.duration,
        "window": [report.start, report.end],
        "indices": report.window.map(|w| [w.start, w.end]),
        "stride": report.stride,
        "y_bounds": [report.y_bounds.0, report.y_bounds.1],
        "annotations": annotations,
    });
    println!("{value}");
}
