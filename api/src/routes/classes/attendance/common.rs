use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use db::models::attendance::AttendanceStatus;

#[derive(Debug, Serialize)]
pub struct AttendanceSessionResponse {
    pub id: i64,
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub attended_count: u64, // students marked present for this session
    pub student_count: u64,  // active roster size
}

impl From<db::models::attendance_session::Model> for AttendanceSessionResponse {
    fn from(m: db::models::attendance_session::Model) -> Self {
        Self {
            id: m.id,
            class_id: m.class_id,
            created_by: m.created_by,
            title: m.title,
            session_date: m.session_date,
            start_time: m.start_time,
            end_time: m.end_time,
            location: m.location,
            is_active: m.is_active,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
            attended_count: 0,
            student_count: 0,
        }
    }
}

impl AttendanceSessionResponse {
    pub fn from_with_counts(
        m: db::models::attendance_session::Model,
        attended_count: u64,
        student_count: u64,
    ) -> Self {
        let mut base = Self::from(m);
        base.attended_count = attended_count;
        base.student_count = student_count;
        base
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub q: Option<String>,    // search in title
    pub active: Option<bool>, // filter by current status
    pub sort: Option<String>, // "created_at", "-created_at", "title", "-title"
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub sessions: Vec<AttendanceSessionResponse>,
    pub page: i32,
    pub per_page: i32,
    pub total: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[validate(length(min = 1, max = 128))]
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    #[validate(length(max = 128))]
    pub location: Option<String>,
}

/// Payload returned by the QR issue/rotate endpoint. `qr_payload` is the
/// deep link the frontend renders as a scannable image.
#[derive(Debug, Serialize, Default)]
pub struct QrTokenResponse {
    pub token: String,
    pub qr_payload: String,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManualAttendanceReq {
    /// Student number, numeric ID, or email.
    pub student_identifier: Option<String>,
    /// Convenience alternative to `student_identifier` for UI callers that
    /// already hold the primary key.
    pub student_pk: Option<i64>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceRecordResponse {
    pub session_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// False when an existing row was updated by the upsert.
    pub created: bool,
}

impl AttendanceRecordResponse {
    pub fn from_record(record: db::models::attendance::Model, created: bool) -> Self {
        Self {
            session_id: record.session_id,
            student_id: record.student_id,
            status: record.status,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            notes: record.notes,
            created,
        }
    }
}
