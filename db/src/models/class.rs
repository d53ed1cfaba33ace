use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};

/// Represents a class (taught group of students) in the `classes` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class code (e.g., "COS301-A").
    pub code: String,
    pub name: String,
    /// Owning teacher; session and attendance authorization derives from this.
    pub teacher_id: i64,
    pub capacity: i32,
    /// When set, an unenrolled student scanning a session QR is enrolled on the fly.
    pub allow_qr_enrollment: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::class_student::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        code: &str,
        name: &str,
        teacher_id: i64,
        capacity: i32,
        allow_qr_enrollment: bool,
    ) -> Result<Self, DbErr> {
        let class = ActiveModel {
            code: Set(code.to_owned()),
            name: Set(name.to_owned()),
            teacher_id: Set(teacher_id),
            capacity: Set(capacity),
            allow_qr_enrollment: Set(allow_qr_enrollment),
            is_active: Set(true),
            ..Default::default()
        };

        class.insert(db).await
    }

    /// True when `user_id` may manage this class (owner or admin).
    pub fn is_managed_by(&self, user_id: i64, is_admin: bool) -> bool {
        is_admin || self.teacher_id == user_id
    }
}
