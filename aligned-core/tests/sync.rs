use aligned_core::{
    keys, seed_store, ManualScheduler, TimeseriesWidget, TransportWidget, VideoCommand, VideoSync,
};
use binding::{DeliveryMode, ModelHandle, SharedStore};
use serde_json::json;
use session::{SessionDefinition, TransportSettings, ViewerSettings};

fn seeded(mode: DeliveryMode) -> SharedStore {
    let store = SharedStore::with_mode(mode);
    let session = SessionDefinition::new(
        "sync",
        (0..=60).map(f64::from).collect(),
        vec![0.0; 61],
    );
    seed_store(&store, &session).unwrap();
    store.set(keys::VIDEO_URL, json!("clip.mp4")).unwrap();
    store
}

fn timeseries(store: &SharedStore) -> TimeseriesWidget<ModelHandle> {
    let mut widget = TimeseriesWidget::new(
        store.connect().unwrap(),
        Box::new(ManualScheduler::new()),
        &ViewerSettings::default(),
    )
    .unwrap();
    widget.render().unwrap();
    widget
}

fn transport(store: &SharedStore) -> TransportWidget<ModelHandle> {
    let mut widget = TransportWidget::new(
        store.connect().unwrap(),
        Box::new(ManualScheduler::new()),
        &TransportSettings::default(),
    );
    widget.render().unwrap();
    widget
}

fn video(store: &SharedStore) -> VideoSync<ModelHandle> {
    let mut widget = VideoSync::new(
        store.connect().unwrap(),
        Box::new(ManualScheduler::new()),
        0.25,
    )
    .unwrap();
    widget.render().unwrap();
    widget
}

#[test]
fn play_in_one_widget_reaches_the_other_without_echo() {
    let store = seeded(DeliveryMode::Immediate);
    let mut a = timeseries(&store);
    let mut b = timeseries(&store);

    assert!(a.toggle_play().unwrap());
    let commits = store.commit_count();

    b.frame(0.0, None).unwrap();
    assert!(b.clock().is_running());
    b.frame(1000.0, None).unwrap();
    assert_eq!(b.viewport().current_time, 1.0);
    assert_eq!(store.commit_count(), commits);
    assert_eq!(store.get(keys::SYNC_TIME), Some(json!(0.0)));

    a.frame(0.0, None).unwrap();
    assert!(a.clock().is_running());
}

#[test]
fn transport_drives_the_playhead_of_every_view() {
    let store = seeded(DeliveryMode::Immediate);
    let mut control = transport(&store);
    let mut view = timeseries(&store);

    control.toggle_play().unwrap();
    control.frame(0.0).unwrap();
    control.frame(500.0).unwrap();
    assert_eq!(store.get(keys::SYNC_TIME), Some(json!(0.5)));

    view.frame(0.0, None).unwrap();
    assert!(view.clock().is_running());
    assert_eq!(view.viewport().current_time, 0.5);

    control.seek_fraction(0.5).unwrap();
    view.frame(16.0, None).unwrap();
    assert!((view.viewport().current_time - 30.016).abs() < 1e-9);
    assert_eq!(control.current_label(), "00:30");
    assert_eq!(control.total_label(), "01:00");
}

#[test]
fn transport_skips_and_clamps() {
    let store = seeded(DeliveryMode::Immediate);
    let mut control = transport(&store);

    assert!(!control.rewind().unwrap());
    assert!(control.forward().unwrap());
    assert_eq!(control.clock().current_time(), 5.0);
    control.seek(58.0).unwrap();
    control.forward().unwrap();
    assert_eq!(control.clock().current_time(), 60.0);
    assert_eq!(control.progress(), 1.0);

    control.toggle_play().unwrap();
    control.frame(0.0).unwrap();
    let commits = store.commit_count();
    control.frame(1000.0).unwrap();
    assert_eq!(store.commit_count(), commits);
}

#[test]
fn video_follows_the_clock_and_does_not_echo_native_events() {
    let store = seeded(DeliveryMode::Immediate);
    let mut control = transport(&store);
    let mut player = video(&store);
    assert_eq!(player.url(), "clip.mp4");

    control.toggle_play().unwrap();
    assert_eq!(player.frame(0.0, 0.0).unwrap(), vec![VideoCommand::Play]);

    control.seek(12.0).unwrap();
    assert_eq!(
        player.frame(16.0, 0.1).unwrap(),
        vec![VideoCommand::SeekTo(12.0)]
    );

    let commits = store.commit_count();
    assert!(!player.on_native_seeked(12.1).unwrap());
    assert!(!player.on_native_play().unwrap());
    assert_eq!(store.commit_count(), commits);

    assert!(player.on_native_pause().unwrap());
    control.frame(32.0).unwrap();
    assert!(!control.clock().is_running());

    assert!(player.on_native_seeked(40.0).unwrap());
    control.pump_changes().unwrap();
    assert_eq!(control.clock().current_time(), 40.0);
}

#[test]
fn small_drift_does_not_trigger_a_seek() {
    let store = seeded(DeliveryMode::Immediate);
    let mut control = transport(&store);
    let mut player = video(&store);

    control.seek(10.0).unwrap();
    assert!(player.frame(0.0, 9.9).unwrap().is_empty());
    assert_eq!(player.clock().current_time(), 10.0);
}

#[test]
fn concurrent_annotation_commits_resolve_to_the_last_write() {
    let store = seeded(DeliveryMode::Deferred);
    let mut a = timeseries(&store);
    let mut b = timeseries(&store);

    b.seek(20.0).unwrap();
    store.flush().unwrap();
    b.frame(0.0, None).unwrap();
    a.frame(0.0, None).unwrap();
    assert_eq!(a.viewport().current_time, 20.0);

    a.add_annotation().unwrap();
    b.add_annotation().unwrap();
    assert_eq!(store.pending_commits(), 2);
    store.flush().unwrap();

    a.frame(16.0, None).unwrap();
    b.frame(16.0, None).unwrap();
    assert_eq!(a.annotations().annotations(), b.annotations().annotations());
    let stored = store.get(keys::ANNOTATIONS).unwrap();
    assert_eq!(stored.as_array().map(Vec::len), Some(1));
}

#[test]
fn missing_video_key_is_reported() {
    let store = SharedStore::new();
    let result = VideoSync::new(
        store.connect().unwrap(),
        Box::new(ManualScheduler::new()),
        0.25,
    );
    assert!(matches!(
        result,
        Err(aligned_core::WidgetError::MissingKey("video_url"))
    ));
}
