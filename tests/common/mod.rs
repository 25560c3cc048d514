#![allow(dead_code)]

use champ_sync::application::ports::remote_gateway::RemoteGateway;
use champ_sync::domain::entities::{FeePayment, Student, Teacher};
use champ_sync::shared::config::AppConfig;
use champ_sync::test_support::InMemoryGateway;
use champ_sync::AppState;
use std::sync::Arc;

pub async fn setup_app(db_name: &str, initially_online: bool) -> (AppState, Arc<InMemoryGateway>) {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
    config.database.max_connections = 1;

    let gateway = Arc::new(InMemoryGateway::new());
    let app = AppState::new(
        config,
        gateway.clone() as Arc<dyn RemoteGateway>,
        initially_online,
    )
    .await
    .unwrap();
    (app, gateway)
}

pub async fn setup_app_with_file(path: &str, initially_online: bool) -> (AppState, Arc<InMemoryGateway>) {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite://{path}?mode=rwc");
    config.database.max_connections = 1;

    let gateway = Arc::new(InMemoryGateway::new());
    let app = AppState::new(
        config,
        gateway.clone() as Arc<dyn RemoteGateway>,
        initially_online,
    )
    .await
    .unwrap();
    (app, gateway)
}

pub fn draft_student(name: &str, roll_number: &str) -> Student {
    Student {
        student_id: format!("STU-{roll_number}"),
        name: name.to_string(),
        roll_number: roll_number.to_string(),
        class_name: "5".to_string(),
        created_by: "admin".to_string(),
        ..Student::default()
    }
}

pub fn draft_teacher(name: &str) -> Teacher {
    Teacher {
        name: name.to_string(),
        subject: "Mathematics".to_string(),
        contact: "9000000001".to_string(),
        email: "teacher@example.org".to_string(),
        qualification: "MSc".to_string(),
        experience: 8,
        salary: Some(48000.0),
        created_by: "admin".to_string(),
        ..Teacher::default()
    }
}

pub fn draft_fee_payment(student_id: &str, amount: f64) -> FeePayment {
    FeePayment {
        student_id: student_id.to_string(),
        amount,
        payment_date: "2026-03-02".to_string(),
        payment_method: Some("cash".to_string()),
        created_by: "admin".to_string(),
        ..FeePayment::default()
    }
}
