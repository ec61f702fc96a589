//! Storage-facing half of the idempotency guard: key checks, response
//! capture records, and the expired-record sweeper. The HTTP middleware that
//! drives this lives in the server crate.

use std::{sync::Arc, time};

use mirror_sync_entity::idempotency_records::Model;
use sea_orm::{DatabaseConnection, DbErr};
use sha3::{Digest, Sha3_256};
use tokio::task::JoinHandle;

use crate::repository::idempotency::{self, NewRecord};

pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Hash of the request body used to detect key reuse with a different payload.
pub fn body_fingerprint(body: &[u8]) -> String {
    hex::encode(Sha3_256::digest(body))
}

pub enum KeyCheck {
    /// No unexpired record, the request should be executed and captured.
    Miss,
    /// Same key, body, endpoint and method seen before: replay the response.
    Replay(Model),
    /// Key reused with a different body (or against a different endpoint).
    Conflict(Model),
}

pub async fn check(
    db: &DatabaseConnection,
    key: &str,
    body_hash: &str,
    path: &str,
    method: &str,
) -> Result<KeyCheck, DbErr> {
    let Some(record) = idempotency::find_active(db, key).await? else {
        return Ok(KeyCheck::Miss);
    };
    if record.body_hash == body_hash && record.path == path && record.method == method {
        Ok(KeyCheck::Replay(record))
    } else {
        Ok(KeyCheck::Conflict(record))
    }
}

pub struct CapturedResponse {
    pub key: String,
    pub body_hash: String,
    pub path: String,
    pub method: String,
    pub body: String,
    pub status_code: u16,
    pub user_id: Option<String>,
}

pub async fn store(
    db: &DatabaseConnection,
    response: CapturedResponse,
    ttl: time::Duration,
) -> Result<(), DbErr> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
    idempotency::insert(
        db,
        NewRecord {
            key: response.key,
            body_hash: response.body_hash,
            path: response.path,
            method: response.method,
            response_body: response.body,
            status_code: response.status_code as i16,
            user_id: response.user_id,
            expires_at: (chrono::Utc::now() + ttl).into(),
        },
    )
    .await
}

pub async fn sweep_expired(db: &DatabaseConnection) -> Result<u64, DbErr> {
    idempotency::sweep_expired(db).await
}

/// Spawns the background loop that reclaims expired records on a fixed
/// interval, fully decoupled from request handling.
pub fn spawn_sweeper(db: Arc<DatabaseConnection>, interval: time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match sweep_expired(&db).await {
                Ok(0) => {}
                Ok(swept) => tracing::info!(swept, "reclaimed expired idempotency records"),
                Err(err) => tracing::error!(error = ?err, "idempotency sweep failed"),
            }
        }
    })
}
