use disco_dive::config::Config;
use disco_dive::worker::WorkerSettings;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn empty_file_yields_defaults() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    fs::write(&path, "").unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.max_concurrent_jobs, 2);
    assert_eq!(cfg.admission_poll_interval(), Duration::from_secs(10));
    assert_eq!(cfg.batch_size(), 100);
    assert_eq!(cfg.request_delay(), Duration::from_millis(1000));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.page_limit(), 50);
    assert_eq!(cfg.insert_position(), Some(0));
    assert!(!cfg.append_tracks);
    assert_eq!(cfg.playlist_name_template, "Disco Dive : ${playlist_name}");
    assert!(cfg.token_path.ends_with("disco-dive/token.json"));
}

#[test]
fn values_are_read_and_clamped() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    let log_dir = td.path().join("logs");
    fs::write(
        &path,
        format!(
            r#"
api_base = "http://localhost:9999/v1"
max_concurrent_jobs = 4
admission_poll_secs = 1
max_batch_size = 500
request_delay_ms = 0
page_limit = 80
playlist_name_template = "Dive: ${{playlist_name}}"
log_dir = "{}"
"#,
            log_dir.display()
        ),
    )
    .unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.api_base, "http://localhost:9999/v1");
    assert_eq!(cfg.max_concurrent_jobs, 4);
    assert_eq!(cfg.admission_poll_interval(), Duration::from_secs(1));
    assert_eq!(cfg.batch_size(), 100);
    assert_eq!(cfg.page_limit(), 50);
    assert_eq!(cfg.log_dir, log_dir);

    let settings = WorkerSettings::from_config(&cfg);
    assert_eq!(settings.batch_size, 100);
    assert!(settings.request_delay.is_zero());
    assert_eq!(settings.name_template, "Dive: ${playlist_name}");
}

#[test]
fn zero_batch_size_is_raised_to_one() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    fs::write(&path, "max_batch_size = 0\npage_limit = 0\n").unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.batch_size(), 1);
    assert_eq!(cfg.page_limit(), 1);
}

#[test]
fn malformed_file_is_an_error() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    fs::write(&path, "max_concurrent_jobs = \"many\"").unwrap();
    assert!(Config::from_path(&path).is_err());
    assert!(Config::from_path(&td.path().join("missing.toml")).is_err());
}

#[test]
fn append_tracks_turns_off_insert_position() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    fs::write(&path, "insert_position = 5\n").unwrap();
    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.insert_position(), Some(5));

    fs::write(&path, "insert_position = 5\nappend_tracks = true\n").unwrap();
    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.insert_position(), None);
    assert_eq!(WorkerSettings::from_config(&cfg).insert_position, None);
}

#[test]
fn zero_admission_poll_is_raised_to_one_second() {
    let td = tempdir().unwrap();
    let path = td.path().join("config.toml");
    fs::write(&path, "admission_poll_secs = 0\n").unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.admission_poll_interval(), Duration::from_secs(1));
}
