use crate::domain::sync_record::{iso_timestamp, SyncRecord};
use crate::domain::value_objects::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffSalaryPayment {
    pub id: String,
    pub staff_id: String,
    pub amount: f64,
    pub month: String,
    pub year: i32,
    pub payment_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

impl SyncRecord for StaffSalaryPayment {
    const KIND: EntityKind = EntityKind::StaffSalaryPayments;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = iso_timestamp(now);
    }
}
