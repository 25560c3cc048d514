use crate::domain::sync_record::{iso_timestamp, SyncRecord};
use crate::domain::value_objects::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

impl SyncRecord for AttendanceRecord {
    const KIND: EntityKind = EntityKind::AttendanceRecords;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = iso_timestamp(now);
    }
}
