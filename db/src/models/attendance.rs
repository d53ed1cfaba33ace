use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, EntityTrait, Set, SqlErr};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One attendance row per (session, student) pair — the pair is the composite
/// primary key, which is what makes the upsert contract race-safe.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "excused")]
    Excused,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields applied on top of an existing row by [`Model::upsert`].
#[derive(Debug, Clone)]
pub struct AttendanceWrite {
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Model {
    pub async fn find_pair(
        db: &DatabaseConnection,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id((session_id, student_id)).one(db).await
    }

    /// Creates or updates the attendance row for (session, student).
    ///
    /// Returns the surviving row and whether it was freshly inserted. A race
    /// between two concurrent inserts for the same pair is resolved through
    /// the composite-key constraint: the loser re-reads and updates instead
    /// of assuming its earlier existence check was authoritative.
    pub async fn upsert(
        db: &DatabaseConnection,
        session_id: i64,
        student_id: i64,
        write: AttendanceWrite,
    ) -> Result<(Self, bool), DbErr> {
        if let Some(existing) = Self::find_pair(db, session_id, student_id).await? {
            let updated = Self::apply(db, existing, &write).await?;
            return Ok((updated, false));
        }

        let row = ActiveModel {
            session_id: Set(session_id),
            student_id: Set(student_id),
            status: Set(write.status),
            check_in_time: Set(write.check_in_time),
            notes: Set(write.notes.clone()),
            ..Default::default()
        };

        match row.insert(db).await {
            Ok(created) => Ok((created, true)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Lost the insert race; the pair now exists, so update it.
                let existing = Self::find_pair(db, session_id, student_id)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!(
                            "Attendance ({session_id}, {student_id}) vanished after conflict"
                        ))
                    })?;
                let updated = Self::apply(db, existing, &write).await?;
                Ok((updated, false))
            }
            Err(e) => Err(e),
        }
    }

    async fn apply(
        db: &DatabaseConnection,
        existing: Self,
        write: &AttendanceWrite,
    ) -> Result<Self, DbErr> {
        let mut active: ActiveModel = existing.into();
        active.status = Set(write.status);
        if write.check_in_time.is_some() {
            active.check_in_time = Set(write.check_in_time);
        }
        if write.notes.is_some() {
            active.notes = Set(write.notes.clone());
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }
}
