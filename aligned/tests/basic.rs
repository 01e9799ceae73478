use session::{encode_f64_le, Annotation, SessionDefinition, ViewerSettings};
use std::process::Command;

fn write_session(dir: &std::path::Path) -> std::path::PathBuf {
    let times: Vec<f64> = (0..=100).map(|i| f64::from(i) * 0.1).collect();
    let mut values: Vec<f64> = times.iter().map(|t| t * 2.0).collect();
    values.extend(times.iter().map(|t| -t));
    let mut session = SessionDefinition::new("walk", times, values);
    session.channel_names = vec!["acc".into(), "acc".into()];
    session.tags = vec!["stance".into()];
    let mut stance = Annotation::new(4.0, 6.0);
    stance.toggle_tag("stance");
    session.annotations = vec![stance, Annotation::new(9.5, 9.9)];
    let path = dir.join("walk.json");
    session.save_to_file(&path).unwrap();
    path
}

#[test]
fn inspect_prints_the_visible_frame() {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let dir = tempfile::tempdir().unwrap();
    let path = write_session(dir.path());

    let output = Command::new(exe)
        .args(["inspect", path.to_str().unwrap(), "--at", "5", "--window", "2", "--width", "400"])
        .output()
        .expect("run aligned inspect");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[Aligned][INFO] walk"));
    assert!(stdout.contains("Channels: 2"));
    assert!(stdout.contains("acc (2)"));
    assert!(stdout.contains("Samples: 101"));
    assert!(stdout.contains("Indices: 40..=60"));
    assert!(stdout.contains("[stance]"));
    assert!(!stdout.contains("#1 "));
}

#[test]
fn inspect_json_lists_visible_annotations() {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let dir = tempfile::tempdir().unwrap();
    let path = write_session(dir.path());

    let output = Command::new(exe)
        .args(["inspect", path.to_str().unwrap(), "--at", "9", "--window", "2", "--jq"])
        .output()
        .expect("run aligned inspect");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let annotations = value["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["index"], 1);
    assert_eq!(value["samples"], 101);
}

#[test]
fn import_builds_a_session_from_raw_floats() {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let dir = tempfile::tempdir().unwrap();
    let times = dir.path().join("times.f64");
    let values = dir.path().join("values.f64");
    let out = dir.path().join("session.json");
    std::fs::write(&times, encode_f64_le(&[0.0, 0.5, 1.0])).unwrap();
    std::fs::write(&values, encode_f64_le(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();

    let status = Command::new(exe)
        .args(["import", "--title", "imu", "--channel", "x", "--channel", "y"])
        .arg("--times")
        .arg(&times)
        .arg("--values")
        .arg(&values)
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run aligned import");
    assert!(status.success());

    let session = SessionDefinition::load_from_file(&out).unwrap();
    assert_eq!(session.title, "imu");
    assert_eq!(session.channel_names, vec!["x", "y"]);
    assert_eq!(session.values.len(), 6);
}

#[test]
fn import_rejects_a_ragged_payload() {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let dir = tempfile::tempdir().unwrap();
    let times = dir.path().join("times.f64");
    let values = dir.path().join("values.f64");
    let out = dir.path().join("session.json");
    std::fs::write(&times, encode_f64_le(&[0.0, 0.5, 1.0])).unwrap();
    std::fs::write(&values, encode_f64_le(&[1.0, 2.0, 3.0, 4.0])).unwrap();

    let output = Command::new(exe)
        .arg("import")
        .arg("--times")
        .arg(&times)
        .arg("--values")
        .arg(&values)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run aligned import");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("[Aligned][ERROR]"));
    assert!(!out.exists());
}

fn run_import(
    dir: &std::path::Path,
    times: &[f64],
    values: &[f64],
    extra: &[&str],
) -> (std::process::Output, std::path::PathBuf) {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let times_path = dir.join("times.f64");
    let values_path = dir.join("values.f64");
    let out = dir.join("session.json");
    std::fs::write(&times_path, encode_f64_le(times)).unwrap();
    std::fs::write(&values_path, encode_f64_le(values)).unwrap();
    let output = Command::new(exe)
        .arg("import")
        .args(extra)
        .arg("--times")
        .arg(&times_path)
        .arg("--values")
        .arg(&values_path)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run aligned import");
    (output, out)
}

#[test]
fn import_rejects_nan_samples() {
    let dir = tempfile::tempdir().unwrap();
    let (output, out) = run_import(dir.path(), &[0.0, 0.5, 1.0], &[0.0, f64::NAN, 1.0], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[Aligned][ERROR]"));
    assert!(stderr.contains("not a finite number"));
    assert!(!out.exists());
}

#[test]
fn import_rejects_a_wrong_number_of_channel_names() {
    let dir = tempfile::tempdir().unwrap();
    let (output, out) = run_import(
        dir.path(),
        &[0.0, 0.5, 1.0],
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        &["--channel", "x"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 channel names given for 2 channels"));
    assert!(!out.exists());
}

#[test]
fn config_writes_loadable_defaults() {
    let exe = env!("CARGO_BIN_EXE_aligned");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("viewer.toml");

    let status = Command::new(exe)
        .args(["config", "--write"])
        .arg(&path)
        .status()
        .expect("run aligned config");
    assert!(status.success());
    assert_eq!(
        ViewerSettings::load_from_file(&path).unwrap(),
        ViewerSettings::default()
    );
}
