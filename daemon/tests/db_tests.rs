mod common;

use common::{FakeCollector, RecordingSink, GB, MB};
use memalert_daemon::db::{Database, TargetStore, TARGETS_KEY};
use memalert_daemon::engine::MonitorEngine;
use memalert_daemon::target::{MonitoredTarget, PersistedTarget};
use memalert_daemon::threshold::ThresholdSet;
use tempfile::tempdir;
use uuid::Uuid;

fn open_temp(dir: &tempfile::TempDir) -> Database {
    let db = Database::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    db
}

#[test]
fn test_create_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("test.db");
    let db = Database::open(&db_path).unwrap();
    db.init_schema().unwrap();
    assert!(db_path.exists());
    assert!(db.load().unwrap().is_empty());
}

#[test]
fn test_kv_put_overwrites() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();
    db.put("k", b"one").unwrap();
    db.put("k", b"two").unwrap();
    assert_eq!(db.get("k").unwrap(), Some(b"two".to_vec()));
    db.delete("k").unwrap();
    assert_eq!(db.get("k").unwrap(), None);
}

#[test]
fn test_save_replaces_whole_list() {
    let dir = tempdir().unwrap();
    let db = open_temp(&dir);
    let a = PersistedTarget {
        id: Uuid::new_v4(),
        name: "a".to_string(),
        identifier: None,
        thresholds_mb: vec![100],
    };
    let b = PersistedTarget {
        id: Uuid::new_v4(),
        name: "b".to_string(),
        identifier: Some("/usr/bin/b".to_string()),
        thresholds_mb: vec![200, 300],
    };
    db.save(&[a.clone(), b.clone()]).unwrap();
    db.save(&[b.clone()]).unwrap();
    assert_eq!(db.load().unwrap(), vec![b]);
}

#[test]
fn test_round_trip_resets_runtime_state() {
    let dir = tempdir().unwrap();
    let collector = FakeCollector::new();
    let sink = RecordingSink::new();
    collector.launch(50, Some("/usr/bin/firefox"), "firefox", 3 * GB);

    let thresholds = ThresholdSet::from_bytes([500 * MB, 2 * GB]).unwrap();
    let target = MonitoredTarget::from_candidate(&collector.candidate(50), thresholds.clone());
    let id = target.id;
    {
        let mut engine = MonitorEngine::new(collector.clone(), sink.clone(), Box::new(open_temp(&dir)));
        engine.add(target);
        let live = engine.target(id).unwrap();
        assert!(live.is_running());
        assert_eq!(live.notified_thresholds().len(), 2);
    }

    let engine = MonitorEngine::new(collector.clone(), sink.clone(), Box::new(open_temp(&dir)));
    let reloaded = engine.target(id).unwrap();
    assert_eq!(reloaded.id, id);
    assert_eq!(reloaded.name, "firefox");
    assert_eq!(reloaded.identifier.as_deref(), Some("/usr/bin/firefox"));
    assert_eq!(reloaded.thresholds(), &thresholds);
    assert!(!reloaded.is_running());
    assert_eq!(reloaded.current_bytes(), 0);
    assert!(reloaded.notified_thresholds().is_empty());
}

#[test]
fn test_persisted_form_has_no_runtime_fields() {
    let target = MonitoredTarget::new("code", None, ThresholdSet::default());
    let json = serde_json::to_value(target.to_persisted()).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);
    assert!(json.get("thresholds_mb").is_some());
    assert!(json.get("current_bytes").is_none());
}

#[test]
fn test_corrupt_blob_is_an_error() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();
    db.put(TARGETS_KEY, b"{not json").unwrap();
    assert!(db.load().is_err());
}

#[test]
fn test_invalid_stored_thresholds_fall_back_to_defaults() {
    let stored = PersistedTarget {
        id: Uuid::new_v4(),
        name: "x".to_string(),
        identifier: None,
        thresholds_mb: vec![0, 100],
    };
    let target = MonitoredTarget::from_persisted(stored);
    assert_eq!(target.thresholds(), &ThresholdSet::default());
}
