use mirror_sync_entity::topic_cursors::{ActiveModel, Column, Entity};
use sea_orm::{sea_query::OnConflict, ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait};

/// Returns the last processed sequence number for the topic, or 0 if the
/// topic has never been polled.
pub async fn get(db: &DatabaseConnection, topic_id: &str) -> Result<i64, DbErr> {
    let cursor = Entity::find_by_id(topic_id).one(db).await?;
    Ok(cursor.map(|c| c.last_sequence).unwrap_or(0))
}

/// Advances the cursor for the topic. Cursors only move forward: an attempt
/// to set a lower value than the stored one is ignored with a warning, since
/// it signals a violated processing invariant rather than a normal update.
pub async fn set(db: &DatabaseConnection, topic_id: &str, sequence_number: i64) -> Result<(), DbErr> {
    let current = get(db, topic_id).await?;
    if sequence_number < current {
        tracing::warn!(
            topic_id,
            current,
            requested = sequence_number,
            "refusing to move topic cursor backwards"
        );
        return Ok(());
    }

    let model = ActiveModel {
        topic_id: Set(topic_id.to_string()),
        last_sequence: Set(sequence_number),
        updated_at: Set(chrono::Utc::now().into()),
    };
    Entity::insert(model)
        .on_conflict(
            OnConflict::column(Column::TopicId)
                .update_columns([Column::LastSequence, Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}
