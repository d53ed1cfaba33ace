use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// A single scheduled class meeting eligible for attendance capture.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    /// Scheduled end. Stamped on `end()` when left unset at creation.
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    /// Current scannable token. Only one token is valid at a time; rotation
    /// overwrites it, invalidating any previously issued code.
    pub qr_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Records,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Generates a fresh random session token (32 hex chars).
fn generate_token() -> String {
    use rand::RngCore;
    let mut buf = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &DatabaseConnection,
        class_id: i64,
        created_by: i64,
        title: &str,
        session_date: NaiveDate,
        start_time: NaiveTime,
        end_time: Option<NaiveTime>,
        location: Option<&str>,
    ) -> Result<Self, DbErr> {
        let session = ActiveModel {
            class_id: Set(class_id),
            created_by: Set(created_by),
            title: Set(title.to_owned()),
            session_date: Set(session_date),
            start_time: Set(start_time),
            end_time: Set(end_time),
            location: Set(location.map(|s| s.to_owned())),
            qr_token: Set(None),
            is_active: Set(true),
            ..Default::default()
        };

        session.insert(db).await
    }

    /// Resolves an *active* session by its current QR token.
    pub async fn find_by_token(
        db: &DatabaseConnection,
        token: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::QrToken.eq(token))
            .filter(Column::IsActive.eq(true))
            .one(db)
            .await
    }

    /// Issues a fresh QR token for this session, overwriting (and thereby
    /// invalidating) any previously issued token.
    pub async fn rotate_qr_token(self, db: &DatabaseConnection) -> Result<Self, DbErr> {
        let token = generate_token();
        let mut active: ActiveModel = self.into();
        active.qr_token = Set(Some(token));
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    /// Ends the session. Idempotent: ending an already-ended session is a
    /// no-op success. Stamps `end_time` with the current time when unset.
    pub async fn end(self, db: &DatabaseConnection) -> Result<Self, DbErr> {
        if !self.is_active {
            return Ok(self);
        }

        let now = Utc::now();
        let stamped_end = self.end_time.or_else(|| Some(now.time()));

        let mut active: ActiveModel = self.into();
        active.is_active = Set(false);
        active.end_time = Set(stamped_end);
        active.updated_at = Set(now);
        active.update(db).await
    }

    /// The scheduled deadline (date + end time) after which check-ins are
    /// rejected. `None` while no end time is set.
    pub fn scheduled_end(&self) -> Option<DateTime<Utc>> {
        self.end_time
            .map(|t| self.session_date.and_time(t).and_utc())
    }
}
