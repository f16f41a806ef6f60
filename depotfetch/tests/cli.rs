use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn invalid_title_id_fails_before_touching_config() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("config.yaml");
    let mut cmd = Command::cargo_bin("depotfetch").expect("Binary exists");

    cmd.arg("fetch").arg("abc").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("abc"));
    assert!(!config.exists(), "no config should be generated for an invalid id");
}

#[test]
fn missing_config_is_generated_and_run_exits_cleanly() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("nested").join("config.yaml");
    let mut cmd = Command::cargo_bin("depotfetch").expect("Binary exists");

    cmd.arg("fetch").arg("228980-extra").arg("--config").arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("wrote defaults"));
    let written = std::fs::read_to_string(&config).expect("default config written");
    assert!(written.contains("type: gated_service"));
    assert!(written.contains("type: local_script"));
    assert!(written.contains("xor_key_material: true"));
}

#[test]
fn help_lists_fetch_subcommand() {
    let mut cmd = Command::cargo_bin("depotfetch").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fetch"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Layer that records every event's debug rendering.
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

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use depotfetch::cli::{run, Cli, Commands};

    // An invalid id returns before any config or network access.
    let cli = Cli {
        command: Commands::Fetch {
            app_id: "not-a-number".to_string(),
            config: std::path::PathBuf::from("dummy.yaml"),
            output_dir: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
