//! Configuration loading tests

use pod_player::config::AppConfig;
use pod_player::error::AppError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_without_file() {
    let config = AppConfig::default();
    assert_eq!(config.playback.volume, 0.75);
    assert_eq!(config.playback.min_progress_secs, 10.0);
    assert!(config.storage.database_path.ends_with("pod-player.redb"));
    assert!(config.validate().is_ok());
}

#[test]
fn file_overrides_defaults() {
    let file = write_config(
        r#"
[playback]
volume = 0.5
rate = 1.25
skip_forward_secs = 45.0

[storage]
database_path = "/tmp/pods/prefs.redb"
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.playback.volume, 0.5);
    assert_eq!(config.playback.rate, 1.25);
    assert_eq!(config.playback.skip_forward_secs, 45.0);
    assert_eq!(config.playback.skip_backward_secs, 15.0);
    assert_eq!(
        config.storage.database_path,
        Path::new("/tmp/pods/prefs.redb")
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/pod-player.toml")));
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn unsupported_rate_is_rejected() {
    let file = write_config("[playback]\nrate = 1.1\n");
    assert!(matches!(
        AppConfig::load(Some(file.path())),
        Err(AppError::Config(_))
    ));
}

#[test]
fn out_of_range_volume_is_rejected() {
    let mut config = AppConfig::default();
    config.playback.volume = 1.5;
    assert!(config.validate().is_err());
}
