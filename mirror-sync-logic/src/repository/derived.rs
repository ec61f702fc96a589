//! Best-effort keyed updates of the derived entities (orders, carbon lots,
//! proofs) plus analytics records. "Entity not found" is reported through the
//! returned boolean, not as an error: the dispatcher logs and moves on.

use mirror_sync_entity::{analytics_events, carbon_lots, orders, proofs};
use sea_orm::{
    sea_query::Expr, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

pub struct EventBacklink {
    pub mirror_event_id: i64,
    pub consensus_timestamp: String,
    pub event_type: Option<String>,
}

pub async fn confirm_order(
    db: &DatabaseConnection,
    order_id: &str,
    backlink: &EventBacklink,
) -> Result<bool, DbErr> {
    let result = orders::Entity::update_many()
        .col_expr(
            orders::Column::MirrorEventId,
            Expr::value(Some(backlink.mirror_event_id)),
        )
        .col_expr(
            orders::Column::MirrorConsensusTimestamp,
            Expr::value(Some(backlink.consensus_timestamp.clone())),
        )
        .col_expr(
            orders::Column::LastEventType,
            Expr::value(backlink.event_type.clone()),
        )
        .col_expr(orders::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(orders::Column::Id.eq(order_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn confirm_carbon_lot(
    db: &DatabaseConnection,
    lot_id: &str,
    backlink: &EventBacklink,
) -> Result<bool, DbErr> {
    let result = carbon_lots::Entity::update_many()
        .col_expr(
            carbon_lots::Column::MirrorEventId,
            Expr::value(Some(backlink.mirror_event_id)),
        )
        .col_expr(
            carbon_lots::Column::MirrorConsensusTimestamp,
            Expr::value(Some(backlink.consensus_timestamp.clone())),
        )
        .col_expr(
            carbon_lots::Column::LastEventType,
            Expr::value(backlink.event_type.clone()),
        )
        .col_expr(
            carbon_lots::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(carbon_lots::Column::Id.eq(lot_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn confirm_proof(
    db: &DatabaseConnection,
    lot_id: &str,
    proof_type: &str,
    backlink: &EventBacklink,
) -> Result<bool, DbErr> {
    let result = proofs::Entity::update_many()
        .col_expr(proofs::Column::Confirmed, Expr::value(true))
        .col_expr(
            proofs::Column::MirrorEventId,
            Expr::value(Some(backlink.mirror_event_id)),
        )
        .col_expr(
            proofs::Column::MirrorConsensusTimestamp,
            Expr::value(Some(backlink.consensus_timestamp.clone())),
        )
        .col_expr(proofs::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(proofs::Column::LotId.eq(lot_id))
        .filter(proofs::Column::ProofType.eq(proof_type))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn log_analytics(
    db: &DatabaseConnection,
    metric: &str,
    metadata: serde_json::Value,
) -> Result<(), DbErr> {
    let model = analytics_events::ActiveModel {
        metric: Set(metric.to_string()),
        metadata: Set(metadata),
        ..Default::default()
    };
    analytics_events::Entity::insert(model).exec(db).await?;
    Ok(())
}
