//! Exercises the full config pipeline end to end: a YAML file on disk,
//! an env-var override, then validation — the same sequence `main`
//! runs at startup.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use sentinel_proxy::config::load_config;

/// `load_config` reads the process environment, so tests that touch
/// `SENTINEL_*` vars must not run concurrently with one another.
fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

const FIXTURE: &str = r#"
server:
  port: 9000
  read_timeout: 30
  write_timeout: 30
  idle_timeout: 30
privacy:
  enabled: true
  detectors: ["all"]
security:
  enabled: true
  mode: log
upstream:
  openai: "https://api.openai.com"
  anthropic: "https://api.anthropic.com"
  ollama: "http://localhost:11434"
  timeout: 60
"#;

fn write_fixture() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config file");
    file.write_all(FIXTURE.as_bytes()).expect("write fixture");
    file
}

#[test]
fn loads_and_validates_a_well_formed_file() {
    let _guard = env_lock().lock().unwrap();
    let file = write_fixture();
    let config = load_config(file.path()).expect("config should load");
    assert_eq!(config.server.port, 9000);
    assert!(config.privacy.enabled);
    assert!(config.security.enabled);
}

// Mutates process-wide env state, so it folds the override assertion and
// the plain-load assertion into one test function rather than risking a
// race with another test's unrelated `load_config` call.
#[test]
fn env_override_wins_over_the_file() {
    let _guard = env_lock().lock().unwrap();
    let file = write_fixture();

    let config = load_config(file.path()).expect("config should load without an override");
    assert_eq!(config.server.port, 9000);

    unsafe { std::env::set_var("SENTINEL_SERVER__PORT", "9999") };
    let overridden = load_config(file.path());
    unsafe { std::env::remove_var("SENTINEL_SERVER__PORT") };

    assert_eq!(overridden.expect("config should load").server.port, 9999);
}

#[test]
fn invalid_port_fails_validation() {
    let _guard = env_lock().lock().unwrap();
    let mut file = tempfile::NamedTempFile::new().expect("create temp config file");
    file.write_all(FIXTURE.replace("port: 9000", "port: 0").as_bytes())
        .expect("write fixture");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("validation failed"));
}

#[test]
fn missing_file_fails_with_a_descriptive_error() {
    let _guard = env_lock().lock().unwrap();
    let err = load_config(std::path::Path::new("/nonexistent/sentinel.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
