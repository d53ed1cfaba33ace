use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Enrollment edge between a class and a student.
///
/// The composite primary key (class_id, student_id) is the uniqueness
/// invariant: re-enrolling a deactivated student reactivates the existing row
/// rather than inserting a second edge.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "class_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    pub is_active: bool,
    /// How the enrollment came to exist.
    pub source: EnrollmentSource,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enum tagging where an enrollment edge came from.
#[derive(
    Debug, Clone, PartialEq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EnrollmentSource {
    #[sea_orm(string_value = "import")]
    Import,
    #[sea_orm(string_value = "join_code")]
    JoinCode,
    #[sea_orm(string_value = "qr")]
    Qr,
    #[sea_orm(string_value = "admin")]
    Admin,
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

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Enrolls a student into a class, reactivating a prior enrollment if one
    /// exists. Never produces a second (class, student) edge.
    pub async fn enroll(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
        source: EnrollmentSource,
    ) -> Result<Self, DbErr> {
        if let Some(existing) = Entity::find_by_id((class_id, student_id)).one(db).await? {
            if existing.is_active {
                return Ok(existing);
            }
            let mut active: ActiveModel = existing.into();
            active.is_active = Set(true);
            active.source = Set(source);
            active.updated_at = Set(Utc::now());
            return active.update(db).await;
        }

        let edge = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            is_active: Set(true),
            source: Set(source),
            ..Default::default()
        };

        match edge.insert(db).await {
            Ok(row) => Ok(row),
            // Concurrent enroll for the same pair: fall back to the surviving row.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let existing = Entity::find_by_id((class_id, student_id))
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!(
                            "Enrollment ({class_id}, {student_id}) vanished after conflict"
                        ))
                    })?;
                let mut active: ActiveModel = existing.into();
                active.is_active = Set(true);
                active.updated_at = Set(Utc::now());
                active.update(db).await
            }
            Err(e) => Err(e),
        }
    }

    /// Deactivates an enrollment. Missing edges are reported as not found.
    pub async fn deactivate(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
    ) -> Result<Self, DbErr> {
        let existing = Entity::find_by_id((class_id, student_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("Enrollment ({class_id}, {student_id}) not found"))
            })?;

        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub async fn find_active(
        db: &DatabaseConnection,
        class_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id((class_id, student_id))
            .filter(Column::IsActive.eq(true))
            .one(db)
            .await
    }

    /// Number of actively enrolled students in a class.
    pub async fn active_count(db: &DatabaseConnection, class_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::IsActive.eq(true))
            .count(db)
            .await
    }
}
