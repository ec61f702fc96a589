use mirror_sync_entity::mirror_events::Model as MirrorEvent;
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::{
    message::{DecodedEnvelope, TopicPayload},
    repository::derived::{self, EventBacklink},
};

/// Routes a stored event to its derived-entity handler. Handler failures are
/// caught and logged here: a missing order or a dead connection must not stop
/// the rest of the poll batch, the event itself is already persisted.
pub async fn dispatch(db: &DatabaseConnection, envelope: &DecodedEnvelope, event: &MirrorEvent) {
    let Some(payload) = &envelope.payload else {
        tracing::debug!(
            topic_id = %event.topic_id,
            sequence_number = event.sequence_number,
            "event has no structured payload, skipping dispatch"
        );
        return;
    };

    if let Err(err) = route(db, payload, event).await {
        tracing::error!(
            topic_id = %event.topic_id,
            sequence_number = event.sequence_number,
            message_type = ?event.message_type,
            error = ?err,
            "failed to apply event side effect"
        );
    }
}

async fn route(
    db: &DatabaseConnection,
    payload: &TopicPayload,
    event: &MirrorEvent,
) -> anyhow::Result<()> {
    let backlink = EventBacklink {
        mirror_event_id: event.id,
        consensus_timestamp: event.consensus_timestamp.clone(),
        event_type: event.message_type.clone(),
    };

    match payload {
        TopicPayload::ProofAdded(proof) => {
            let updated =
                derived::confirm_proof(db, &proof.lot_id, &proof.proof_type, &backlink).await?;
            if !updated {
                tracing::info!(
                    lot_id = %proof.lot_id,
                    proof_type = %proof.proof_type,
                    sequence_number = event.sequence_number,
                    "proof referenced by event not found"
                );
            }
        }
        TopicPayload::OrderCreated(order)
        | TopicPayload::OrderDelivered(order)
        | TopicPayload::OrderSettled(order) => {
            let updated = derived::confirm_order(db, &order.order_id, &backlink).await?;
            if !updated {
                tracing::info!(
                    order_id = %order.order_id,
                    sequence_number = event.sequence_number,
                    "order referenced by event not found"
                );
            }
        }
        TopicPayload::CarbonLotCreated(lot) | TopicPayload::CarbonLotUpdated(lot) => {
            let updated = derived::confirm_carbon_lot(db, &lot.lot_id, &backlink).await?;
            if !updated {
                tracing::info!(
                    lot_id = %lot.lot_id,
                    sequence_number = event.sequence_number,
                    "carbon lot referenced by event not found"
                );
            }
        }
        TopicPayload::SettlementCompleted(settlement) => {
            derived::log_analytics(
                db,
                "settlement_completed",
                json!({
                    "orderId": settlement.order_id,
                    "lotId": settlement.lot_id,
                    "topicId": event.topic_id,
                    "sequenceNumber": event.sequence_number,
                    "consensusTimestamp": event.consensus_timestamp,
                }),
            )
            .await?;
        }
        TopicPayload::Unrecognized(_) => {
            tracing::debug!(
                topic_id = %event.topic_id,
                sequence_number = event.sequence_number,
                message_type = ?event.message_type,
                "event type has no handler, leaving unrouted"
            );
        }
    }
    Ok(())
}
