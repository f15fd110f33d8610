use q2_mapbot::load_config::{load_config, REPO_PATH_ENV};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A full config maps onto the core crate's status and pipeline settings.
#[tokio::test]
#[serial]
async fn test_load_config_reads_both_sections() {
    env::remove_var(REPO_PATH_ENV);
    let config_file = config_file(
        r#"
status:
  timeout_ms: 750
  channels: "all,-42"
ingest:
  repo_path: /srv/q2-content
  temp_dir: /tmp/mapbot
  remote: origin
  branch: main
  channels: "+7"
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.status.client.timeout(), Duration::from_millis(750));
    assert!(config.status.channels.allows("1"));
    assert!(!config.status.channels.allows("42"));

    let ingest = config.ingest.expect("ingest section");
    assert_eq!(ingest.pipeline.repo_path, PathBuf::from("/srv/q2-content"));
    assert_eq!(ingest.pipeline.temp_dir, PathBuf::from("/tmp/mapbot"));
    assert_eq!(ingest.pipeline.remote.as_deref(), Some("origin"));
    assert_eq!(ingest.pipeline.branch.as_deref(), Some("main"));
    assert!(ingest.pipeline.allowed_prefixes.contains(&"maps/".to_string()));
    assert!(ingest.channels.allows("7"));
    assert!(!ingest.channels.allows("8"));
}

/// An empty document yields defaults: 2s timeout, no channels, no ingestion.
#[tokio::test]
#[serial]
async fn test_load_config_defaults() {
    let config_file = config_file("{}\n");

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.status.client.timeout(), Duration::from_secs(2));
    assert!(!config.status.channels.allows("1"));
    assert!(config.ingest.is_none());
}

/// A bare numeric channel id is accepted as a single-channel rule.
#[tokio::test]
#[serial]
async fn test_load_config_accepts_numeric_channel() {
    let config_file = config_file("status:\n  channels: 123456789012345678\n");

    let config = load_config(config_file.path()).expect("Config should load");

    assert!(config.status.channels.allows("123456789012345678"));
    assert!(!config.status.channels.allows("1"));
}

/// The environment overrides the repository path from the file.
#[tokio::test]
#[serial]
async fn test_load_config_env_overrides_repo_path() {
    let config_file = config_file("ingest:\n  repo_path: /from/file\n");
    env::set_var(REPO_PATH_ENV, "/from/env");

    let result = load_config(config_file.path());
    env::remove_var(REPO_PATH_ENV);

    let ingest = result.expect("Config should load").ingest.expect("ingest section");
    assert_eq!(ingest.pipeline.repo_path, PathBuf::from("/from/env"));
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports
/// as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = config_file("not-yaml: [:::");

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_missing_repo_path() {
    let config_file = config_file("ingest:\n  remote: origin\n");

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("YAML"), "got: {err}");
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

/// Both sections announce themselves once loaded.
#[tokio::test]
#[serial]
async fn test_load_config_traces_every_section() {
    env::remove_var(REPO_PATH_ENV);
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: events.clone(),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    let config_file = config_file("status:\n  timeout_ms: 900\ningest:\n  repo_path: /srv/q2\n");

    load_config(config_file.path()).expect("Config should load");

    let event_msgs = events.lock().unwrap();
    for expected in ["Loaded status config", "Loaded pipeline config"] {
        assert!(
            event_msgs.iter().any(|msg| msg.contains(expected)),
            "Expected a '{expected}' trace event, got: {:?}",
            event_msgs
        );
    }
}
