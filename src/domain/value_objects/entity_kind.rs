use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven synchronizable tables mirrored from the hosted database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Students,
    Teachers,
    Staff,
    FeePayments,
    AttendanceRecords,
    SalaryPayments,
    StaffSalaryPayments,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Students,
        EntityKind::Teachers,
        EntityKind::Staff,
        EntityKind::FeePayments,
        EntityKind::AttendanceRecords,
        EntityKind::SalaryPayments,
        EntityKind::StaffSalaryPayments,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Students => "students",
            EntityKind::Teachers => "teachers",
            EntityKind::Staff => "staff",
            EntityKind::FeePayments => "fee_payments",
            EntityKind::AttendanceRecords => "attendance_records",
            EntityKind::SalaryPayments => "salary_payments",
            EntityKind::StaffSalaryPayments => "staff_salary_payments",
        }
    }

    /// Foreign-key attribute used for parent-scoped scans, where one exists.
    pub fn parent_field(&self) -> Option<&'static str> {
        match self {
            EntityKind::Students | EntityKind::Teachers | EntityKind::Staff => None,
            EntityKind::FeePayments | EntityKind::AttendanceRecords => Some("student_id"),
            EntityKind::SalaryPayments => Some("teacher_id"),
            EntityKind::StaffSalaryPayments => Some("staff_id"),
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.table_name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
