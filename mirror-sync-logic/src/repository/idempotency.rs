use chrono::{DateTime, FixedOffset};
use mirror_sync_entity::idempotency_records::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue::Set,
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};

/// Looks up an unexpired record for the key. Expired rows are treated as
/// absent even before the sweeper reclaims them.
pub async fn find_active(db: &DatabaseConnection, key: &str) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(key)
        .filter(Column::ExpiresAt.gt(chrono::Utc::now()))
        .one(db)
        .await
}

pub struct NewRecord {
    pub key: String,
    pub body_hash: String,
    pub path: String,
    pub method: String,
    pub response_body: String,
    pub status_code: i16,
    pub user_id: Option<String>,
    pub expires_at: DateTime<FixedOffset>,
}

/// Persists a freshly captured response for the key. The key is the primary
/// key, so a concurrent insert race is settled by the database: the first
/// writer wins, later writers only overwrite rows whose expiry has already
/// passed (a reclaimed key behaves as brand new).
pub async fn insert(db: &DatabaseConnection, record: NewRecord) -> Result<(), DbErr> {
    let now = chrono::Utc::now();
    let model = ActiveModel {
        key: Set(record.key),
        body_hash: Set(record.body_hash),
        path: Set(record.path),
        method: Set(record.method),
        response_body: Set(record.response_body),
        status_code: Set(record.status_code),
        user_id: Set(record.user_id),
        created_at: Set(now.into()),
        expires_at: Set(record.expires_at),
    };
    let result = Entity::insert(model)
        .on_conflict(
            OnConflict::column(Column::Key)
                .update_columns([
                    Column::BodyHash,
                    Column::Path,
                    Column::Method,
                    Column::ResponseBody,
                    Column::StatusCode,
                    Column::UserId,
                    Column::CreatedAt,
                    Column::ExpiresAt,
                ])
                .action_and_where(Expr::col((Entity, Column::ExpiresAt)).lte(now))
                .to_owned(),
        )
        .exec(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Deletes all expired records, returning how many were reclaimed.
pub async fn sweep_expired(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lte(chrono::Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
