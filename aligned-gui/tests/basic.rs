use aligned_core::keys;
use aligned_gui::{AlignedApp, GuiConfig, GuiError};
use serde_json::json;
use session::{Annotation, SessionDefinition, ViewerSettings, WindowSettings};

fn session() -> SessionDefinition {
    let mut session = SessionDefinition::new(
        "gait",
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0, 1.0, 0.0, -1.0, 1.0, 1.0, 1.0, 1.0],
    );
    session.channel_names = vec!["left".into(), "right".into()];
    session.tags = vec!["step".into()];
    session.annotations = vec![Annotation::new(0.5, 1.5)];
    session
}

#[test]
fn app_builds_one_view_per_request_over_one_store() {
    let app = AlignedApp::new(session(), ViewerSettings::default(), 3, None).unwrap();
    assert_eq!(app.view_count(), 3);
    assert!(!app.has_video());
    // transport plus three views, each on clock, annotations and tags keys
    assert!(app.store().subscriber_count() >= 4);
    assert_eq!(app.store().get(keys::TITLE), Some(json!("gait")));
}

#[test]
fn zero_views_still_shows_one() {
    let app = AlignedApp::new(session(), ViewerSettings::default(), 0, None).unwrap();
    assert_eq!(app.view_count(), 1);
}

#[test]
fn ragged_session_fails_to_open() {
    let mut broken = session();
    broken.values.pop();
    let result = AlignedApp::new(broken, ViewerSettings::default(), 1, None);
    assert!(matches!(result, Err(GuiError::Widget(_))));
}

#[test]
fn missing_video_file_disables_the_panel() {
    let mut with_video = session();
    with_video.video = Some("/nonexistent/clip.mp4".into());
    let app = AlignedApp::new(with_video, ViewerSettings::default(), 1, None).unwrap();
    assert!(!app.has_video());
}

#[test]
fn save_writes_the_edited_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut app = AlignedApp::new(session(), ViewerSettings::default(), 1, None).unwrap();

    app.store()
        .set(
            keys::ANNOTATIONS,
            json!([{ "start": 2.0, "end": 2.5, "tags": ["step"] }]),
        )
        .unwrap();
    app.save_session(&path).unwrap();

    let saved = SessionDefinition::load_from_file(&path).unwrap();
    assert_eq!(saved.annotations.len(), 1);
    assert_eq!(saved.annotations[0].start, 2.0);
    assert!(saved.annotations[0].has_tag("step"));
    assert_eq!(saved.times, session().times);
}

#[test]
fn attaching_a_video_publishes_it() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.MP4");
    std::fs::write(&clip, b"").unwrap();
    let mut app = AlignedApp::new(session(), ViewerSettings::default(), 1, None).unwrap();

    app.attach_video(&clip).unwrap();
    assert!(app.has_video());
    assert_eq!(
        app.store().get(keys::VIDEO_URL),
        Some(json!(clip.display().to_string()))
    );
    assert_eq!(app.snapshot().video, Some(clip));

    let other = dir.path().join("clip.avi");
    std::fs::write(&other, b"").unwrap();
    assert!(app.attach_video(&other).is_err());
}

#[test]
fn gui_config_takes_the_window_settings() {
    let window = WindowSettings {
        title: "Lab".into(),
        width: 800.0,
        height: 600.0,
    };
    let config = GuiConfig::from(&window);
    assert_eq!(config.title, "Lab");
    assert_eq!(config.width, 800.0);
    assert_eq!(config.views, 1);
}
