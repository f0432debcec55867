use mockito::Server;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &Path, api_base: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        format!(
            "api_base = \"{}\"\nrequest_delay_ms = 0\nlog_dir = \"{}\"\ntoken_path = \"{}\"\n",
            api_base,
            dir.join("logs").display(),
            dir.join("token.json").display()
        ),
    )
    .unwrap();
    path
}

fn log_contents(dir: &Path) -> String {
    fs::read_dir(dir.join("logs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("disco-dive.log"))
        .map(|e| fs::read_to_string(e.path()).unwrap())
        .collect()
}

#[test]
fn failed_job_exits_nonzero_and_reaches_the_log_file() {
    let mut server = Server::new();
    let _m = server.mock("GET", "/me").with_status(401).create();

    let td = tempdir().unwrap();
    let cfg = write_config(td.path(), &server.url());

    let out = Command::new(env!("CARGO_BIN_EXE_disco-dive"))
        .arg("--config")
        .arg(&cfg)
        .args(["dive", "seed"])
        .env("SPOTIFY_ACCESS_TOKEN", "tok")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("seed: failed"));
    let log = log_contents(td.path());
    assert!(log.contains("failed"), "log file was: {}", log);
}

#[test]
fn config_validate_prints_ok() {
    let td = tempdir().unwrap();
    let cfg = write_config(td.path(), "http://127.0.0.1:9");

    let out = Command::new(env!("CARGO_BIN_EXE_disco-dive"))
        .arg("--config")
        .arg(&cfg)
        .arg("config-validate")
        .output()
        .unwrap();

    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("OK"));
}
