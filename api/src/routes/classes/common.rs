use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use db::models::class_student::EnrollmentSource;

#[derive(Debug, Default, Serialize)]
pub struct ClassResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub teacher_id: i64,
    pub capacity: i32,
    pub allow_qr_enrollment: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::models::class::Model> for ClassResponse {
    fn from(m: db::models::class::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            teacher_id: m.teacher_id,
            capacity: m.capacity,
            allow_qr_enrollment: m.allow_qr_enrollment,
            is_active: m.is_active,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassReq {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 1, max = 1000))]
    pub capacity: Option<i32>,
    pub allow_qr_enrollment: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditClassReq {
    #[validate(length(min = 1, max = 32))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub capacity: Option<i32>,
    pub allow_qr_enrollment: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollStudentReq {
    /// Student number, numeric ID, or email.
    pub student_identifier: String,
    pub source: Option<EnrollmentSource>,
}

#[derive(Debug, Serialize)]
pub struct RosterEntryResponse {
    pub student_id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub source: EnrollmentSource,
    pub enrolled_at: DateTime<Utc>,
}
