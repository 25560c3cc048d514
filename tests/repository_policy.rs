mod common;

use champ_sync::application::ports::remote_gateway::RemoteGateway;
use champ_sync::domain::entities::{Student, Teacher};
use champ_sync::domain::value_objects::{ChangeOp, EntityKind};
use champ_sync::shared::config::AppConfig;
use champ_sync::test_support::InMemoryGateway;
use champ_sync::AppState;
use common::{draft_student, draft_teacher, setup_app};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn online_salary_update_pushes_without_a_background_cycle() {
    let (app, gateway) = setup_app("policy_salary", true).await;
    let stored = app.repository.create(draft_teacher("R. Iyer")).await.unwrap();

    let updated = app
        .repository
        .update::<Teacher>(&stored.record.id, json!({"salary": 52000.0}))
        .await
        .unwrap();

    // No reconciliation cycle ran; the facade pushed the single record.
    assert_eq!(updated.sync.sync_pending, 0);
    assert_eq!(updated.record.salary, Some(52000.0));
    assert_eq!(gateway.select_count(), 0);
    assert_eq!(
        gateway.record(EntityKind::Teachers, &stored.record.id).unwrap()["salary"],
        52000.0
    );
}

#[tokio::test]
async fn prefer_offline_reads_skip_the_remote_even_when_online() {
    let mut config = AppConfig::default();
    config.database.url = "sqlite:file:policy_prefer_offline?mode=memory&cache=shared".to_string();
    config.database.max_connections = 1;
    config.sync.prefer_offline = true;

    let gateway = Arc::new(InMemoryGateway::new());
    let app = AppState::new(config, gateway.clone() as Arc<dyn RemoteGateway>, true)
        .await
        .unwrap();

    gateway.seed(
        EntityKind::Students,
        vec![json!({
            "id": "remote-1",
            "student_id": "STU-900",
            "name": "Remote Student",
            "roll_number": "1",
            "class": "6",
            "created_at": "2026-03-01T09:00:00.000Z",
            "updated_at": "2026-03-01T09:00:00.000Z",
            "created_by": "admin"
        })],
    );

    // Reads come from the (empty) mirror, not the remote.
    assert!(app.repository.list::<Student>().await.unwrap().is_empty());
    assert_eq!(gateway.select_count(), 0);

    // Writes still push immediately while online.
    let stored = app
        .repository
        .create(draft_student("Asha Verma", "12"))
        .await
        .unwrap();
    assert_eq!(stored.sync.sync_pending, 0);
    assert_eq!(gateway.insert_count(), 1);
}

#[tokio::test]
async fn auto_sync_disabled_keeps_writes_local() {
    let mut config = AppConfig::default();
    config.database.url = "sqlite:file:policy_no_auto_sync?mode=memory&cache=shared".to_string();
    config.database.max_connections = 1;
    config.sync.auto_sync = false;

    let gateway = Arc::new(InMemoryGateway::new());
    let app = AppState::new(config, gateway.clone() as Arc<dyn RemoteGateway>, true)
        .await
        .unwrap();

    let stored = app
        .repository
        .create(draft_student("Asha Verma", "12"))
        .await
        .unwrap();

    assert_eq!(stored.sync.sync_pending, 1);
    assert_eq!(gateway.insert_count(), 0);
    assert_eq!(app.status.status().await.unwrap().pending_changes, 1);
}

#[tokio::test]
async fn every_facade_mutation_is_journaled_as_an_intent() {
    let (app, _gateway) = setup_app("policy_intents", false).await;

    let stored = app
        .repository
        .create(draft_student("Asha Verma", "12"))
        .await
        .unwrap();
    app.repository
        .update::<Student>(&stored.record.id, json!({"roll_number": "14"}))
        .await
        .unwrap();
    app.repository
        .delete::<Student>(&stored.record.id)
        .await
        .unwrap();

    let intents = app.change_intents().await.unwrap();
    assert_eq!(intents.len(), 3);
    assert_eq!(intents[0].op, ChangeOp::Create);
    assert_eq!(intents[0].record_id, stored.record.id);
    assert_eq!(intents[1].op, ChangeOp::Update);
    assert_eq!(intents[2].op, ChangeOp::Delete);
}
