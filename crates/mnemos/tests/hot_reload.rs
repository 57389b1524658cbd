//! Hot-reload integration tests.
//!
//! External edits reach bindable members through the watcher; every other
//! member keeps its in-memory value until an explicit restore.

use std::time::Duration;

use mnemos::prelude::*;
use mnemos_test::{AppConfig, NotificationRecorder, TempConfigDir};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(400);

fn watched_store(dir: &TempConfigDir) -> (ConfigStore, ConfigHandle<AppConfig>) {
    let store = ConfigStore::new();
    store.set_settings::<AppConfig>(dir.settings()).unwrap();
    let handle = store.get_or_create::<AppConfig>().unwrap();
    assert!(store.is_watching::<AppConfig>());
    (store, handle)
}

#[test]
fn external_edit_notifies_once() {
    let dir = TempConfigDir::new();
    let (_store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    dir.edit_json("AppConfig.json", |v| v["log_level"] = "debug".into());

    assert!(recorder.wait_for(1, WAIT), "no notification received");
    std::thread::sleep(QUIET);
    assert_eq!(
        recorder.events(),
        vec![("debug".to_string(), "info".to_string())]
    );
    assert_eq!(handle.read().log_level.current_value(), "debug");
}

#[test]
fn unchanged_rewrite_does_not_notify() {
    let dir = TempConfigDir::new();
    let (_store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    let text = dir.read("AppConfig.json");
    dir.write("AppConfig.json", &text);

    assert!(!recorder.wait_for(1, QUIET));
    assert_eq!(recorder.count(), 0);
}

#[test]
fn non_bindable_edits_are_not_applied() {
    let dir = TempConfigDir::new();
    let (store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    dir.edit_json("AppConfig.json", |v| {
        v["port"] = 1.into();
        v["log_level"] = "error".into();
    });

    assert!(recorder.wait_for(1, WAIT));
    assert_eq!(handle.read().port, 8080);

    store.restore_from_file::<AppConfig>().unwrap();
    assert_eq!(handle.read().port, 1);
    assert_eq!(recorder.count(), 1, "restore sees the value already applied");
}

#[test]
fn own_writes_do_not_notify_twice() {
    let dir = TempConfigDir::new();
    let (store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    let mut next = handle.snapshot();
    next.log_level = Bindable::new("trace".into());
    store.update(next).unwrap();

    std::thread::sleep(QUIET);
    assert_eq!(
        recorder.events(),
        vec![("trace".to_string(), "info".to_string())]
    );
}

#[test]
fn dispose_stops_watching() {
    let dir = TempConfigDir::new();
    let (store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    assert!(store.dispose::<AppConfig>());
    assert!(!store.is_watching::<AppConfig>());

    dir.edit_json("AppConfig.json", |v| v["log_level"] = "debug".into());
    assert!(!recorder.wait_for(1, QUIET));
}

#[test]
fn failed_restore_keeps_hot_reload() {
    let dir = TempConfigDir::new();
    let (store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    dir.edit_json("AppConfig.json", |v| v["port"] = "oops".into());
    let err = store.restore_from_file::<AppConfig>().unwrap_err();
    assert!(matches!(err, ConfigError::Cast { .. }));
    assert!(store.is_watching::<AppConfig>());

    dir.edit_json("AppConfig.json", |v| v["log_level"] = "debug".into());

    assert!(recorder.wait_for(1, WAIT), "no notification after failed restore");
    std::thread::sleep(QUIET);
    assert_eq!(
        recorder.events(),
        vec![("debug".to_string(), "info".to_string())]
    );
    assert_eq!(handle.read().port, 8080);
}

#[test]
fn broken_file_is_skipped_until_fixed() {
    let dir = TempConfigDir::new();
    let (store, handle) = watched_store(&dir);
    let recorder = NotificationRecorder::new();
    recorder.attach(&handle.read().log_level);

    let mut valid = dir.read_json("AppConfig.json");
    dir.write("AppConfig.json", "{ not json");
    assert!(!recorder.wait_for(1, QUIET));
    assert!(store.is_watching::<AppConfig>());

    valid["log_level"] = "warn".into();
    dir.write("AppConfig.json", &serde_json::to_string_pretty(&valid).unwrap());

    assert!(recorder.wait_for(1, WAIT), "no notification after the file was fixed");
    std::thread::sleep(QUIET);
    assert_eq!(
        recorder.events(),
        vec![("warn".to_string(), "info".to_string())]
    );
    assert!(store.is_watching::<AppConfig>());
}
