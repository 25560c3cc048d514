use crate::domain::sync_record::{iso_timestamp, SyncRecord};
use crate::domain::value_objects::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeePayment {
    pub id: String,
    pub student_id: String,
    pub amount: f64,
    pub payment_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

impl SyncRecord for FeePayment {
    const KIND: EntityKind = EntityKind::FeePayments;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = iso_timestamp(now);
    }
}
