//! Unit tests for configuration loading

mod common;

use common::fixtures::*;
use fleet_snapshot::ConfigManager;
use std::path::PathBuf;

const NIGHTLY_GROUP: &str = r#"
[snapshots.nightly]
schedule = "0 2 * * *"
storage = "/var/lib/fleet-snapshots"
time_zone = "Europe/Sofia"
starting_deadline_seconds = 600
successful_snapshot_limit = 14

[snapshots.hourly]
schedule = "0 * * * *"
storage = "/var/lib/fleet-snapshots"
suspend = true
"#;

#[tokio::test]
async fn test_load_main_and_groups() {
    let dir = TestConfigBuilder::new().with_group("production", NIGHTLY_GROUP).build();

    let manager = ConfigManager::new(dir.path_string()).await.unwrap();
    let config = manager.get_current_config();

    assert_eq!(config.database_path, "data/test.db");
    assert_eq!(config.reconcile_schedule, "0 * * * * *");
    assert_eq!(config.fleet_api.request_timeout_seconds, 30);
    assert_eq!(config.fleet_api.token, None);

    assert_eq!(config.snapshot_names(), vec!["hourly", "nightly"]);

    let nightly = &config.snapshots["nightly"];
    assert_eq!(nightly.name, "nightly");
    assert_eq!(nightly.time_zone.as_deref(), Some("Europe/Sofia"));
    assert_eq!(nightly.starting_deadline_seconds, Some(600));
    assert_eq!(nightly.successful_snapshot_limit, Some(14));
    assert_eq!(nightly.storage, PathBuf::from("/var/lib/fleet-snapshots"));
    assert!(!nightly.suspend);

    let hourly = &config.snapshots["hourly"];
    assert!(hourly.suspend);
    assert_eq!(hourly.successful_snapshot_limit, None);
}

#[tokio::test]
async fn test_main_config_overrides() {
    let dir = TestConfigBuilder::new()
        .with_main_config(
            r#"
database_path = "/srv/state.db"
reconcile_schedule = "*/15 * * * * *"

[fleet_api]
base_url = "https://hub.example.com"
token = "s3cret"
request_timeout_seconds = 5
"#,
        )
        .build();

    let config = ConfigManager::new(dir.path_string()).await.unwrap().get_current_config();

    assert_eq!(config.database_path, "/srv/state.db");
    assert_eq!(config.reconcile_schedule, "*/15 * * * * *");
    assert_eq!(config.fleet_api.token.as_deref(), Some("s3cret"));
    assert_eq!(config.fleet_api.request_timeout_seconds, 5);
    assert!(config.snapshots.is_empty());
}

#[tokio::test]
async fn test_duplicate_names_across_files_are_rejected() {
    let dir = TestConfigBuilder::new()
        .with_group("a", "[snapshots.fleet]\nschedule = \"0 * * * *\"\nstorage = \"/data\"\n")
        .with_group("b", "[snapshots.fleet]\nschedule = \"0 2 * * *\"\nstorage = \"/data\"\n")
        .build();

    let err = ConfigManager::new(dir.path_string()).await.err().unwrap();
    assert!(err.to_string().contains("defined in both"), "{}", err);
}

#[tokio::test]
async fn test_invalid_schedule_is_fatal() {
    let dir = TestConfigBuilder::new()
        .with_group("broken", "[snapshots.fleet]\nschedule = \"every day\"\nstorage = \"/data\"\n")
        .build();

    let err = ConfigManager::new(dir.path_string()).await.err().unwrap();
    assert!(err.to_string().contains("Invalid schedule"), "{}", err);
}

#[tokio::test]
async fn test_seconds_field_schedule_is_rejected_for_snapshots() {
    let dir = TestConfigBuilder::new()
        .with_group("broken", "[snapshots.fleet]\nschedule = \"0 0 2 * * *\"\nstorage = \"/data\"\n")
        .build();

    assert!(ConfigManager::new(dir.path_string()).await.is_err());
}

#[tokio::test]
async fn test_unknown_time_zone_is_fatal() {
    let dir = TestConfigBuilder::new()
        .with_group(
            "broken",
            "[snapshots.fleet]\nschedule = \"0 2 * * *\"\nstorage = \"/data\"\ntime_zone = \"Nowhere/City\"\n",
        )
        .build();

    assert!(ConfigManager::new(dir.path_string()).await.is_err());
}

#[tokio::test]
async fn test_invalid_reconcile_schedule_is_fatal() {
    let dir = TestConfigBuilder::new()
        .with_main_config("reconcile_schedule = \"* * * * *\"\n[fleet_api]\nbase_url = \"http://x\"\n")
        .build();

    let err = ConfigManager::new(dir.path_string()).await.err().unwrap();
    assert!(err.to_string().contains("reconcile_schedule"), "{}", err);
}

#[tokio::test]
async fn test_missing_main_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(ConfigManager::new(dir.path().to_string_lossy().into_owned()).await.is_err());
}
