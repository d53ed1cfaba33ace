use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    SqlErr,
};

use super::attendance::{self, AttendanceStatus};
use super::attendance_session;
use crate::analytics;

/// Denormalized per-(class, student) attendance aggregate.
///
/// This is an explicit cache: it is only as fresh as the last `recompute` call
/// and is never updated transactionally with attendance writes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub total_sessions: i32,
    pub present_count: i32,
    pub absent_count: i32,
    pub late_count: i32,
    pub excused_count: i32,
    /// Percentage with excused sessions counted toward attendance, rounded to
    /// two decimals. Intentionally a different formula from the per-session
    /// analytics rate, which counts only `present`.
    pub rate: f64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_pair(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// Recomputes the cached aggregate for (class, student) from the
    /// attendance rows and stores it, creating the summary row on first use.
    pub async fn recompute(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
    ) -> Result<Self, DbErr> {
        let session_ids: Vec<i64> = attendance_session::Entity::find()
            .select_only()
            .column(attendance_session::Column::Id)
            .filter(attendance_session::Column::ClassId.eq(class_id))
            .into_tuple()
            .all(db)
            .await?;

        let total_sessions = session_ids.len() as i32;

        let count_status = |status: AttendanceStatus| {
            let ids = session_ids.clone();
            async move {
                attendance::Entity::find()
                    .filter(attendance::Column::SessionId.is_in(ids))
                    .filter(attendance::Column::StudentId.eq(student_id))
                    .filter(attendance::Column::Status.eq(status))
                    .count(db)
                    .await
            }
        };

        let present_count = count_status(AttendanceStatus::Present).await? as i32;
        let absent_count = count_status(AttendanceStatus::Absent).await? as i32;
        let late_count = count_status(AttendanceStatus::Late).await? as i32;
        let excused_count = count_status(AttendanceStatus::Excused).await? as i32;

        let rate = if total_sessions == 0 {
            0.0
        } else {
            analytics::round2(
                f64::from(present_count + excused_count) / f64::from(total_sessions) * 100.0,
            )
        };

        let now = Utc::now();

        if let Some(existing) = Self::find_pair(db, class_id, student_id).await? {
            let mut active: ActiveModel = existing.into();
            active.total_sessions = Set(total_sessions);
            active.present_count = Set(present_count);
            active.absent_count = Set(absent_count);
            active.late_count = Set(late_count);
            active.excused_count = Set(excused_count);
            active.rate = Set(rate);
            active.computed_at = Set(now);
            return active.update(db).await;
        }

        let row = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            total_sessions: Set(total_sessions),
            present_count: Set(present_count),
            absent_count: Set(absent_count),
            late_count: Set(late_count),
            excused_count: Set(excused_count),
            rate: Set(rate),
            computed_at: Set(now),
            ..Default::default()
        };

        match row.insert(db).await {
            Ok(created) => Ok(created),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Two concurrent recomputes; re-run the update path.
                let existing = Self::find_pair(db, class_id, student_id)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!(
                            "Summary ({class_id}, {student_id}) vanished after conflict"
                        ))
                    })?;
                let mut active: ActiveModel = existing.into();
                active.total_sessions = Set(total_sessions);
                active.present_count = Set(present_count);
                active.absent_count = Set(absent_count);
                active.late_count = Set(late_count);
                active.excused_count = Set(excused_count);
                active.rate = Set(rate);
                active.computed_at = Set(now);
                active.update(db).await
            }
            Err(e) => Err(e),
        }
    }
}
