//! Service-level scenarios and a live server round trip.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use session_vault::audit::{actions, AuditStore, AuditWriter, JsonlAuditStore, MemoryAuditStore};
use session_vault::clock::ManualClock;
use session_vault::crypto::{ConfiguredKey, Envelope, EncryptionKey};
use session_vault::http::HttpServer;
use session_vault::lifecycle::{bootstrap, Shutdown};
use session_vault::notes::{MemoryNoteStore, NoteError, NoteStore, SessionNoteService};
use session_vault::security::{Principal, Role};

mod common;

use common::*;

fn therapist() -> Principal {
    Principal::new("t1", Role::Therapist)
}

#[tokio::test]
async fn test_audit_outage_does_not_fail_operations() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START_MS));
    let broken = AuditStore::Jsonl(JsonlAuditStore::new(
        dir.path().join("missing-dir").join("audit.jsonl"),
    ));
    let service = SessionNoteService::new(
        MemoryNoteStore::new(),
        Envelope::new(Arc::new(EncryptionKey::from_hex(KEY_HEX).unwrap())),
        AuditWriter::new(broken, clock.clone()),
        clock,
    );

    let t1 = therapist();
    let created = service
        .create_note(Some(&t1), "A1", "Paciente estable")
        .await
        .unwrap();
    let view = service.read_note(Some(&t1), &created.id).await.unwrap();
    assert_eq!(view.content, "Paciente estable");
    service
        .update_note(Some(&t1), &created.id, "Paciente estable, alta", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_store_write_leaves_no_audit() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = MemoryNoteStore::load_from_file(dir.path().join("gone").join("notes.json"))
        .await
        .unwrap();
    let audit = MemoryAuditStore::new();
    let service = SessionNoteService::new(
        store,
        Envelope::new(Arc::new(EncryptionKey::from_hex(KEY_HEX).unwrap())),
        AuditWriter::new(audit.clone(), clock.clone()),
        clock,
    );

    let err = service
        .create_note(Some(&therapist()), "A1", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, NoteError::Store(_)));
    assert!(service.store().is_empty());
    assert!(audit.records().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancelled_create_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.json");
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = MemoryNoteStore::load_from_file(&path).await.unwrap();
    let audit = MemoryAuditStore::new();
    let service = SessionNoteService::new(
        store,
        Envelope::new(Arc::new(EncryptionKey::from_hex(KEY_HEX).unwrap())),
        AuditWriter::new(audit.clone(), clock.clone()),
        clock,
    );

    let fifo = path.with_extension("tmp");
    let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    let t1 = therapist();
    let create = service.create_note(Some(&t1), "A1", "Paciente estable");
    let timed_out = tokio::time::timeout(Duration::from_millis(200), create).await;
    assert!(timed_out.is_err());

    assert!(service.store().is_empty());
    let admin = Principal::new("a1", Role::Admin);
    let page = service
        .list_notes(Some(&admin), Default::default(), 1)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(audit
        .records()
        .iter()
        .all(|r| r.action != actions::NOTE_CREATED));

    let drained = tokio::task::spawn_blocking(move || std::fs::read(&fifo))
        .await
        .unwrap()
        .unwrap();
    assert!(!drained.is_empty());
    assert!(!path.exists());
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_key_rotation_without_reencryption_is_detected() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let key = Arc::new(ConfiguredKey::new(
        Some(KEY_HEX.to_string()),
        "SESSION_VAULT_TEST_UNSET_ROTATION",
    ));
    let audit = MemoryAuditStore::new();
    let service = SessionNoteService::new(
        MemoryNoteStore::new(),
        Envelope::new(key.clone()),
        AuditWriter::new(audit.clone(), clock.clone()),
        clock,
    );

    let t1 = therapist();
    let created = service.create_note(Some(&t1), "A1", "antes").await.unwrap();

    key.replace_inline(Some("11".repeat(32)));
    let err = service.read_note(Some(&t1), &created.id).await.unwrap_err();
    assert!(matches!(err, NoteError::DataIntegrity { .. }));
    assert!(audit
        .records()
        .iter()
        .any(|r| r.action == actions::NOTE_INTEGRITY_FAILURE));

    // New notes are sealed with the new key.
    let fresh = service.create_note(Some(&t1), "A2", "despues").await.unwrap();
    assert_eq!(
        service.read_note(Some(&t1), &fresh.id).await.unwrap().content,
        "despues"
    );
}

#[tokio::test]
async fn test_denials_are_audited_without_content() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let audit = MemoryAuditStore::new();
    let service = SessionNoteService::new(
        MemoryNoteStore::new(),
        Envelope::new(Arc::new(EncryptionKey::from_hex(KEY_HEX).unwrap())),
        AuditWriter::new(audit.clone(), clock.clone()),
        clock,
    );

    let created = service
        .create_note(Some(&therapist()), "A1", "Paciente estable")
        .await
        .unwrap();
    let intruder = Principal::new("t2", Role::Therapist);
    let _ = service.read_note(Some(&intruder), &created.id).await;

    let records = audit.records();
    let denial = records
        .iter()
        .find(|r| r.action == actions::NOTE_ACCESS_DENIED)
        .unwrap();
    assert_eq!(denial.user_id.as_deref(), Some("t2"));
    assert_eq!(denial.entity_id.as_deref(), Some(created.id.as_str()));
    assert_eq!(denial.details.as_ref().unwrap()["operation"], "read");

    let serialized = serde_json::to_string(&records).unwrap();
    assert!(!serialized.contains("Paciente estable"));
}

#[tokio::test]
async fn test_live_server_serves_and_shuts_down() {
    let config = test_config();
    let services = bootstrap(&config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(services.state.clone(), config);
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    let client = reqwest::Client::new();
    let health = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);

    let created = client
        .post(format!("http://{addr}/notes"))
        .bearer_auth(THERAPIST_TOKEN)
        .json(&serde_json::json!({ "appointment_id": "A9", "subjective": "Paciente estable" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(services.state.notes.store().get(&id).await.unwrap().is_some());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap()
        .unwrap();
}
