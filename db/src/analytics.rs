//! Attendance analytics: per-session counts, per-(class, student) rates, and
//! the global statistics used by the admin dashboard.
//!
//! Two rate formulas coexist on purpose. The session-level rate counts only
//! `present` records; the class-level rate (used by the summary cache) also
//! counts `excused` toward attendance. They model different questions and are
//! deliberately not unified.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use crate::models::{
    attendance::{self, AttendanceStatus},
    attendance_session, class_student, user,
};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A present record in a session's analytics listing.
#[derive(Debug, Serialize)]
pub struct PresentRecord {
    pub student_id: i64,
    pub username: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
}

/// Aggregate counts for one session.
#[derive(Debug, Serialize)]
pub struct SessionAnalytics {
    pub session_id: i64,
    pub present_count: u64,
    pub total_students: u64,
    pub absent_count: u64,
    /// `present / roster * 100`, 0 for an empty roster. Excused records do
    /// not count as present here.
    pub rate: f64,
    pub present: Vec<PresentRecord>,
}

/// Computes attendance counts and the present-student listing for a session.
///
/// `total_students` is the *current* active roster size, so the rate reflects
/// the roster as of the query, not as of the session date.
pub async fn session_analytics(
    db: &DatabaseConnection,
    session: &attendance_session::Model,
) -> Result<SessionAnalytics, DbErr> {
    let present_count = attendance::Entity::find()
        .filter(attendance::Column::SessionId.eq(session.id))
        .filter(attendance::Column::Status.eq(AttendanceStatus::Present))
        .count(db)
        .await?;

    let total_students = class_student::Model::active_count(db, session.class_id).await?;

    let rate = if total_students == 0 {
        0.0
    } else {
        round2(present_count as f64 / total_students as f64 * 100.0)
    };

    let present = attendance::Entity::find()
        .filter(attendance::Column::SessionId.eq(session.id))
        .filter(attendance::Column::Status.eq(AttendanceStatus::Present))
        .order_by_asc(attendance::Column::CheckInTime)
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(record, student)| PresentRecord {
            student_id: record.student_id,
            username: student.map(|u| u.username).unwrap_or_default(),
            status: record.status,
            check_in_time: record.check_in_time,
        })
        .collect();

    Ok(SessionAnalytics {
        session_id: session.id,
        present_count,
        total_students,
        absent_count: total_students.saturating_sub(present_count),
        rate,
        present,
    })
}

/// Class-level attendance rate for one student:
/// `(present + excused) / total_sessions * 100`, rounded to two decimals.
pub async fn class_attendance_rate(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
) -> Result<f64, DbErr> {
    let session_ids: Vec<i64> = attendance_session::Entity::find()
        .select_only()
        .column(attendance_session::Column::Id)
        .filter(attendance_session::Column::ClassId.eq(class_id))
        .into_tuple()
        .all(db)
        .await?;

    if session_ids.is_empty() {
        return Ok(0.0);
    }
    let total = session_ids.len() as f64;

    let attended = attendance::Entity::find()
        .filter(attendance::Column::SessionId.is_in(session_ids))
        .filter(attendance::Column::StudentId.eq(student_id))
        .filter(
            attendance::Column::Status
                .eq(AttendanceStatus::Present)
                .or(attendance::Column::Status.eq(AttendanceStatus::Excused)),
        )
        .count(db)
        .await?;

    Ok(round2(attended as f64 / total * 100.0))
}

/// Global attendance statistics across all sessions.
#[derive(Debug, Serialize)]
pub struct GlobalStatistics {
    pub total_records: u64,
    pub present_count: u64,
    pub rate: f64,
}

pub async fn global_statistics(db: &DatabaseConnection) -> Result<GlobalStatistics, DbErr> {
    let total_records = attendance::Entity::find().count(db).await?;
    let present_count = attendance::Entity::find()
        .filter(attendance::Column::Status.eq(AttendanceStatus::Present))
        .count(db)
        .await?;

    let rate = if total_records == 0 {
        0.0
    } else {
        round2(present_count as f64 / total_records as f64 * 100.0)
    };

    Ok(GlobalStatistics {
        total_records,
        present_count,
        rate,
    })
}
