use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use hms_access::auth::user::{Identity, UserRole};
use hms_access::config::AccessConfig;
use hms_access::core::{AuthStore, ManualClock};
use hms_access::storage::{FileStorage, MemoryStorage, PersistedAuth, StateStorage};

#[test]
fn test_memory_storage_roundtrip() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.load("key").unwrap(), None);

    storage.save("key", "value").unwrap();
    assert_eq!(storage.load("key").unwrap(), Some("value".to_string()));

    storage.save("key", "other").unwrap();
    assert_eq!(storage.load("key").unwrap(), Some("other".to_string()));
}

#[test]
fn test_file_storage_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(tmp.path().join("state")).unwrap();
    assert_eq!(storage.load("hms-auth-storage").unwrap(), None);

    storage.save("hms-auth-storage", "{\"a\":1}").unwrap();
    assert_eq!(
        storage.load("hms-auth-storage").unwrap().as_deref(),
        Some("{\"a\":1}")
    );
    assert!(storage.root().join("hms-auth-storage.json").exists());
    assert!(!storage.root().join("hms-auth-storage.json.tmp").exists());
}

#[test]
fn test_file_storage_rejects_path_like_keys() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(tmp.path()).unwrap();
    assert!(storage.save("../escape", "x").is_err());
    assert!(storage.save("", "x").is_err());
    assert!(storage.load(".hidden").is_err());
}

#[test]
fn test_persisted_record_layout() {
    let expires = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
    let identity = Identity::new("nurse-001", "James", "nurse@hospital.com", UserRole::Nurse);
    let record = PersistedAuth::signed_in(identity, expires);

    let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(value["isAuthenticated"], true);
    assert_eq!(value["sessionExpiry"], expires.timestamp_millis());
    assert_eq!(value["identity"]["id"], "nurse-001");

    let signed_out: serde_json::Value =
        serde_json::from_str(&PersistedAuth::signed_out().to_json().unwrap()).unwrap();
    assert_eq!(signed_out["isAuthenticated"], false);
    assert!(signed_out["identity"].is_null());
    assert!(signed_out["sessionExpiry"].is_null());
}

#[test]
fn test_live_session_requires_every_field() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let identity = Identity::new("doc-001", "Dr. Chen", "doctor@hospital.com", UserRole::Doctor);

    let live = PersistedAuth::signed_in(identity.clone(), now + Duration::minutes(1));
    assert!(live.clone().live_session(now).is_some());

    let expired = PersistedAuth::signed_in(identity.clone(), now);
    assert!(expired.live_session(now).is_none());

    let not_authenticated = PersistedAuth {
        is_authenticated: false,
        ..live.clone()
    };
    assert!(not_authenticated.live_session(now).is_none());

    let no_expiry = PersistedAuth {
        session_expiry: None,
        ..live
    };
    assert!(no_expiry.live_session(now).is_none());
}

#[tokio::test]
async fn test_file_backed_store_survives_reload() {
    let tmp = tempfile::tempdir().unwrap();
    let config = AccessConfig {
        storage_dir: Some(tmp.path().to_path_buf()),
        ..AccessConfig::for_testing()
    };
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));

    let store = AuthStore::builder(config.clone())
        .with_clock(clock.clone())
        .build();
    assert!(store.login("admin@hospital.com", "password123").await);
    drop(store);

    let reloaded = AuthStore::builder(config.clone())
        .with_clock(clock.clone())
        .build();
    assert_eq!(reloaded.current_identity().unwrap().id, "admin-001");
    drop(reloaded);

    clock.advance(Duration::minutes(30));
    let expired = AuthStore::builder(config).with_clock(clock).build();
    assert!(!expired.is_authenticated());
}
