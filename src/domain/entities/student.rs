use crate::domain::sync_record::{iso_timestamp, SyncRecord};
use crate::domain::value_objects::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub roll_number: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_paid_current_year: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_year_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

impl SyncRecord for Student {
    const KIND: EntityKind = EntityKind::Students;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        let stamp = iso_timestamp(now);
        self.created_at = stamp.clone();
        self.updated_at = stamp;
    }
}
