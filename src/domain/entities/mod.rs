mod attendance_record;
mod change_intent;
mod fee_payment;
mod mirror_record;
mod provenance;
mod salary_payment;
mod staff;
mod staff_salary_payment;
mod student;
mod sync_report;
mod teacher;

pub use attendance_record::AttendanceRecord;
pub use change_intent::{ChangeIntent, ChangeIntentDraft};
pub use fee_payment::FeePayment;
pub use mirror_record::MirrorRecord;
pub use provenance::{Stored, SyncProvenance};
pub use salary_payment::SalaryPayment;
pub use staff::Staff;
pub use staff_salary_payment::StaffSalaryPayment;
pub use student::Student;
pub use sync_report::SyncReport;
pub use teacher::Teacher;
