//! Check-in processing: QR scans and teacher-initiated manual entries.
//!
//! Both paths funnel into the same (session, student)-keyed upsert, so a
//! retried POST or a concurrent duplicate scan can never produce two rows.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use thiserror::Error;

use crate::models::{
    attendance::{self, AttendanceStatus, AttendanceWrite},
    attendance_session,
    class,
    class_student::{self, EnrollmentSource},
    user,
};

/// Typed failure taxonomy for check-in and manual attendance entry.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid or expired QR token")]
    InvalidToken,
    #[error("Session has already ended")]
    SessionEnded,
    #[error("Student is not enrolled in this class")]
    NotEnrolled,
    #[error("Attendance already recorded as present")]
    AlreadyCheckedIn,
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Outcome of a successful check-in or manual entry.
#[derive(Debug)]
pub struct CheckInOutcome {
    pub record: attendance::Model,
    /// False when an existing row was updated rather than inserted.
    pub created: bool,
}

/// Records a student as present via a scanned QR token.
///
/// Validation order: token resolves to an active session, the session's
/// scheduled end has not passed, the student exists, and the student is
/// actively enrolled (or the class auto-enrolls on QR). A row already marked
/// `present` is rejected so the UI can report "already marked present".
pub async fn check_in_by_qr(
    db: &DatabaseConnection,
    token: &str,
    student_identifier: &str,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, CheckInError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CheckInError::Validation("QR token is required".into()));
    }

    let session = attendance_session::Model::find_by_token(db, token)
        .await?
        .ok_or(CheckInError::InvalidToken)?;

    if let Some(deadline) = session.scheduled_end() {
        if now > deadline {
            return Err(CheckInError::SessionEnded);
        }
    }

    let student = resolve_student(db, student_identifier).await?;

    let enrolled = class_student::Model::find_active(db, session.class_id, student.id)
        .await?
        .is_some();
    if !enrolled {
        let class = class::Entity::find_by_id(session.class_id)
            .one(db)
            .await?
            .ok_or(CheckInError::NotFound("Class"))?;
        if !class.allow_qr_enrollment {
            return Err(CheckInError::NotEnrolled);
        }
        class_student::Model::enroll(db, class.id, student.id, EnrollmentSource::Qr).await?;
        tracing::info!(
            class_id = class.id,
            student_id = student.id,
            "Auto-enrolled student via QR scan"
        );
    }

    if let Some(existing) = attendance::Model::find_pair(db, session.id, student.id).await? {
        if existing.status == AttendanceStatus::Present {
            return Err(CheckInError::AlreadyCheckedIn);
        }
    }

    let (record, created) = attendance::Model::upsert(
        db,
        session.id,
        student.id,
        AttendanceWrite {
            status: AttendanceStatus::Present,
            check_in_time: Some(now),
            notes: None,
        },
    )
    .await?;

    Ok(CheckInOutcome { record, created })
}

/// Parameters for a teacher-initiated manual attendance entry.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
}

/// Creates or updates an attendance row by hand.
///
/// Idempotent: posting the same entry twice leaves exactly one row. Status
/// defaults to `present`; check-in time defaults to `now` only for `present`
/// entries with no explicit time.
pub async fn manual_upsert(
    db: &DatabaseConnection,
    session_id: i64,
    student_identifier: &str,
    entry: ManualEntry,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, CheckInError> {
    let session = attendance_session::Entity::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or(CheckInError::NotFound("Attendance session"))?;

    let student = resolve_student(db, student_identifier).await?;

    let status = entry.status.unwrap_or(AttendanceStatus::Present);
    let check_in_time = match entry.check_in_time {
        Some(t) => Some(t),
        None if status == AttendanceStatus::Present => Some(now),
        None => None,
    };

    let (record, created) = attendance::Model::upsert(
        db,
        session.id,
        student.id,
        AttendanceWrite {
            status,
            check_in_time,
            notes: entry.notes,
        },
    )
    .await?;

    Ok(CheckInOutcome { record, created })
}

/// Resolves a student by identifier, trying the student number, then the
/// numeric primary key, then the email address — in that priority order.
pub async fn resolve_student(
    db: &DatabaseConnection,
    identifier: &str,
) -> Result<user::Model, CheckInError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(CheckInError::Validation(
            "Student identifier is required".into(),
        ));
    }

    if let Some(found) = user::Model::find_by_username(db, identifier).await? {
        return Ok(found);
    }

    if let Ok(id) = identifier.parse::<i64>() {
        if let Some(found) = user::Entity::find_by_id(id).one(db).await? {
            return Ok(found);
        }
    }

    if let Some(found) = user::Model::find_by_email(db, identifier).await? {
        return Ok(found);
    }

    Err(CheckInError::NotFound("Student"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_student::EnrollmentSource;
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    struct Fixture {
        class: class::Model,
        session: attendance_session::Model,
        token: String,
        student: user::Model,
    }

    async fn seed(db: &DatabaseConnection, auto_enroll: bool) -> Fixture {
        let teacher = user::Model::create(db, "teach", "teach@test.com", "pw", false)
            .await
            .unwrap();
        let student = user::Model::create(db, "u20001234", "stud@test.com", "pw", false)
            .await
            .unwrap();
        let class = class::Model::create(db, "CS101", "Intro", teacher.id, 30, auto_enroll)
            .await
            .unwrap();
        let session = attendance_session::Model::create(
            db,
            class.id,
            teacher.id,
            "Lecture 1",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            Some(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            None,
        )
        .await
        .unwrap()
        .rotate_qr_token(db)
        .await
        .unwrap();
        let token = session.qr_token.clone().unwrap();

        Fixture {
            class,
            session,
            token,
            student,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn qr_check_in_records_present_once() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;
        class_student::Model::enroll(&db, fx.class.id, fx.student.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        let outcome = check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5))
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.record.status, AttendanceStatus::Present);
        assert_eq!(outcome.record.check_in_time, Some(at(8, 5)));

        // Second scan is rejected, and still only one row exists.
        let dup = check_in_by_qr(&db, &fx.token, "u20001234", at(8, 6)).await;
        assert!(matches!(dup, Err(CheckInError::AlreadyCheckedIn)));

        let rows = attendance::Entity::find()
            .filter(attendance::Column::SessionId.eq(fx.session.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn scan_after_deadline_fails_session_ended() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;
        class_student::Model::enroll(&db, fx.class.id, fx.student.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        let late = check_in_by_qr(&db, &fx.token, "u20001234", at(10, 30)).await;
        assert!(matches!(late, Err(CheckInError::SessionEnded)));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let db = setup_test_db().await;
        seed(&db, false).await;

        let res = check_in_by_qr(&db, "deadbeefdeadbeef", "u20001234", at(8, 5)).await;
        assert!(matches!(res, Err(CheckInError::InvalidToken)));
    }

    #[tokio::test]
    async fn unenrolled_student_rejected_unless_auto_enroll() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;

        let res = check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5)).await;
        assert!(matches!(res, Err(CheckInError::NotEnrolled)));
    }

    #[tokio::test]
    async fn auto_enroll_creates_qr_sourced_enrollment() {
        let db = setup_test_db().await;
        let fx = seed(&db, true).await;

        let outcome = check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5))
            .await
            .unwrap();
        assert!(outcome.created);

        let edge = class_student::Model::find_active(&db, fx.class.id, fx.student.id)
            .await
            .unwrap()
            .expect("enrollment edge created");
        assert_eq!(edge.source, EnrollmentSource::Qr);
    }

    #[tokio::test]
    async fn auto_enroll_reactivates_deactivated_edge() {
        let db = setup_test_db().await;
        let fx = seed(&db, true).await;
        class_student::Model::enroll(&db, fx.class.id, fx.student.id, EnrollmentSource::Import)
            .await
            .unwrap();
        class_student::Model::deactivate(&db, fx.class.id, fx.student.id)
            .await
            .unwrap();

        check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5))
            .await
            .unwrap();

        // Unique-together invariant holds across reactivation.
        let edges = class_student::Entity::find()
            .filter(class_student::Column::ClassId.eq(fx.class.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(edges, 1);
    }

    #[tokio::test]
    async fn manual_upsert_is_idempotent() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;
        class_student::Model::enroll(&db, fx.class.id, fx.student.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        let entry = ManualEntry {
            status: Some(AttendanceStatus::Late),
            notes: Some("bus strike".into()),
            check_in_time: None,
        };

        let first = manual_upsert(&db, fx.session.id, "u20001234", entry.clone(), at(8, 20))
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.record.status, AttendanceStatus::Late);
        // Not a present entry, so no implicit check-in time.
        assert!(first.record.check_in_time.is_none());

        let second = manual_upsert(&db, fx.session.id, "u20001234", entry, at(8, 25))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.record.status, AttendanceStatus::Late);

        let rows = attendance::Entity::find()
            .filter(attendance::Column::SessionId.eq(fx.session.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn manual_upsert_defaults_present_with_time() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;

        let outcome = manual_upsert(
            &db,
            fx.session.id,
            &fx.student.id.to_string(),
            ManualEntry {
                status: None,
                notes: None,
                check_in_time: None,
            },
            at(8, 15),
        )
        .await
        .unwrap();

        assert_eq!(outcome.record.status, AttendanceStatus::Present);
        assert_eq!(outcome.record.check_in_time, Some(at(8, 15)));
    }

    #[tokio::test]
    async fn manual_upsert_overrides_qr_status() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;
        class_student::Model::enroll(&db, fx.class.id, fx.student.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5))
            .await
            .unwrap();

        let excused = manual_upsert(
            &db,
            fx.session.id,
            "u20001234",
            ManualEntry {
                status: Some(AttendanceStatus::Excused),
                notes: None,
                check_in_time: None,
            },
            at(9, 0),
        )
        .await
        .unwrap();
        assert!(!excused.created);
        assert_eq!(excused.record.status, AttendanceStatus::Excused);
    }

    #[tokio::test]
    async fn identifier_resolution_prefers_student_number() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;

        // By student number.
        let by_number = resolve_student(&db, "u20001234").await.unwrap();
        assert_eq!(by_number.id, fx.student.id);

        // By primary key.
        let by_pk = resolve_student(&db, &fx.student.id.to_string())
            .await
            .unwrap();
        assert_eq!(by_pk.id, fx.student.id);

        // By email.
        let by_email = resolve_student(&db, "stud@test.com").await.unwrap();
        assert_eq!(by_email.id, fx.student.id);

        assert!(matches!(
            resolve_student(&db, "nobody").await,
            Err(CheckInError::NotFound("Student"))
        ));
        assert!(matches!(
            resolve_student(&db, "  ").await,
            Err(CheckInError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn two_distinct_students_get_two_rows() {
        let db = setup_test_db().await;
        let fx = seed(&db, false).await;
        let second = user::Model::create(&db, "u20005678", "b@test.com", "pw", false)
            .await
            .unwrap();
        for sid in [fx.student.id, second.id] {
            class_student::Model::enroll(&db, fx.class.id, sid, EnrollmentSource::Admin)
                .await
                .unwrap();
        }

        check_in_by_qr(&db, &fx.token, "u20001234", at(8, 5))
            .await
            .unwrap();
        check_in_by_qr(&db, &fx.token, "u20005678", at(8, 6))
            .await
            .unwrap();

        let rows = attendance::Entity::find()
            .filter(attendance::Column::SessionId.eq(fx.session.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }
}
