use anyhow::Context;
use mirror_sync_entity::mirror_events::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::message::DecodedEnvelope;

/// Appends a decoded message to the event log. The (topic_id, sequence_number)
/// pair is unique; re-inserting an already-seen message is a no-op that
/// returns the previously stored row, so overlapping poll windows and worker
/// restarts are safe.
pub async fn upsert(
    db: &DatabaseConnection,
    topic_id: &str,
    sequence_number: i64,
    consensus_timestamp: &str,
    running_hash: &str,
    envelope: &DecodedEnvelope,
) -> anyhow::Result<Model> {
    let model = ActiveModel {
        topic_id: Set(topic_id.to_string()),
        sequence_number: Set(sequence_number),
        consensus_timestamp: Set(consensus_timestamp.to_string()),
        running_hash: Set(running_hash.to_string()),
        raw_message: Set(envelope.raw_text.clone()),
        payload: Set(envelope.json.clone()),
        message_type: Set(envelope.correlation.message_type.clone()),
        lot_id: Set(envelope.correlation.lot_id.clone()),
        order_id: Set(envelope.correlation.order_id.clone()),
        proof_type: Set(envelope.correlation.proof_type.clone()),
        submitted_by: Set(envelope.correlation.submitted_by.clone()),
        ..Default::default()
    };

    let result = Entity::insert(model)
        .on_conflict(
            OnConflict::columns([Column::TopicId, Column::SequenceNumber])
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(err) => return Err(err).context("inserting mirror event"),
    }

    find_by_topic_and_sequence(db, topic_id, sequence_number)
        .await?
        .context("mirror event missing right after insert")
}

pub async fn find_by_topic_and_sequence(
    db: &DatabaseConnection,
    topic_id: &str,
    sequence_number: i64,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TopicId.eq(topic_id))
        .filter(Column::SequenceNumber.eq(sequence_number))
        .one(db)
        .await
}
