use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::{
    idempotency::{self, body_fingerprint, CapturedResponse, KeyCheck},
    tests::init_db,
};

fn captured(key: &str, body: &str) -> CapturedResponse {
    CapturedResponse {
        key: key.to_string(),
        body_hash: body_fingerprint(body.as_bytes()),
        path: "/api/v1/orders".to_string(),
        method: "POST".to_string(),
        body: r#"{"id":"ord-1"}"#.to_string(),
        status_code: 201,
        user_id: Some("user-1".to_string()),
    }
}

const TTL: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn fresh_key_is_a_miss() {
    let db = init_db("idempotency_db_miss").await;

    let hash = body_fingerprint(b"{}");
    let check = idempotency::check(&db.client(), "key-aaaaaaaaaaaaaaaa", &hash, "/api/v1/orders", "POST")
        .await
        .unwrap();

    assert!(matches!(check, KeyCheck::Miss));
}

#[tokio::test]
async fn stored_response_is_replayed_for_matching_request() {
    let db = init_db("idempotency_db_replay").await;
    let key = "key-bbbbbbbbbbbbbbbb";
    let body = r#"{"lotId":"l1","amount":10}"#;

    idempotency::store(&db.client(), captured(key, body), TTL)
        .await
        .unwrap();

    let hash = body_fingerprint(body.as_bytes());
    let check = idempotency::check(&db.client(), key, &hash, "/api/v1/orders", "POST")
        .await
        .unwrap();
    match check {
        KeyCheck::Replay(record) => {
            assert_eq!(record.response_body, r#"{"id":"ord-1"}"#);
            assert_eq!(record.status_code, 201);
        }
        _ => panic!("expected a replay"),
    }
}

#[tokio::test]
async fn different_body_is_a_conflict() {
    let db = init_db("idempotency_db_conflict").await;
    let key = "key-cccccccccccccccc";

    idempotency::store(&db.client(), captured(key, r#"{"amount":10}"#), TTL)
        .await
        .unwrap();

    let other_hash = body_fingerprint(br#"{"amount":99}"#);
    let check = idempotency::check(&db.client(), key, &other_hash, "/api/v1/orders", "POST")
        .await
        .unwrap();

    assert!(matches!(check, KeyCheck::Conflict(_)));
}

#[tokio::test]
async fn different_endpoint_is_a_conflict() {
    let db = init_db("idempotency_db_endpoint_conflict").await;
    let key = "key-dddddddddddddddd";
    let body = r#"{"amount":10}"#;

    idempotency::store(&db.client(), captured(key, body), TTL)
        .await
        .unwrap();

    let hash = body_fingerprint(body.as_bytes());
    let check = idempotency::check(&db.client(), key, &hash, "/api/v1/lots", "POST")
        .await
        .unwrap();

    assert!(matches!(check, KeyCheck::Conflict(_)));
}

#[tokio::test]
async fn expired_key_behaves_as_unseen_and_can_be_reused() {
    let db = init_db("idempotency_db_expiry").await;
    let key = "key-eeeeeeeeeeeeeeee";
    let body = r#"{"amount":10}"#;

    idempotency::store(&db.client(), captured(key, body), Duration::ZERO)
        .await
        .unwrap();

    let hash = body_fingerprint(body.as_bytes());
    let check = idempotency::check(&db.client(), key, &hash, "/api/v1/orders", "POST")
        .await
        .unwrap();
    assert!(matches!(check, KeyCheck::Miss));

    // A fresh store for the reclaimed key must overwrite the stale row.
    let mut fresh = captured(key, body);
    fresh.body = r#"{"id":"ord-2"}"#.to_string();
    idempotency::store(&db.client(), fresh, TTL).await.unwrap();

    let check = idempotency::check(&db.client(), key, &hash, "/api/v1/orders", "POST")
        .await
        .unwrap();
    match check {
        KeyCheck::Replay(record) => assert_eq!(record.response_body, r#"{"id":"ord-2"}"#),
        _ => panic!("expected a replay after reuse"),
    }
}

#[tokio::test]
async fn unexpired_key_is_not_overwritten() {
    let db = init_db("idempotency_db_keep_first").await;
    let key = "key-ffffffffffffffff";
    let body = r#"{"amount":10}"#;

    idempotency::store(&db.client(), captured(key, body), TTL)
        .await
        .unwrap();
    let mut second = captured(key, body);
    second.body = r#"{"id":"ord-9"}"#.to_string();
    idempotency::store(&db.client(), second, TTL).await.unwrap();

    let hash = body_fingerprint(body.as_bytes());
    match idempotency::check(&db.client(), key, &hash, "/api/v1/orders", "POST")
        .await
        .unwrap()
    {
        KeyCheck::Replay(record) => assert_eq!(record.response_body, r#"{"id":"ord-1"}"#),
        _ => panic!("expected a replay"),
    }
}

#[tokio::test]
async fn sweep_removes_only_expired_records() {
    let db = init_db("idempotency_db_sweep").await;

    idempotency::store(&db.client(), captured("key-1111111111111111", "a"), Duration::ZERO)
        .await
        .unwrap();
    idempotency::store(&db.client(), captured("key-2222222222222222", "b"), Duration::ZERO)
        .await
        .unwrap();
    idempotency::store(&db.client(), captured("key-3333333333333333", "c"), TTL)
        .await
        .unwrap();

    let swept = idempotency::sweep_expired(&db.client()).await.unwrap();
    assert_eq!(swept, 2);

    let hash = body_fingerprint(b"c");
    let check = idempotency::check(&db.client(), "key-3333333333333333", &hash, "/api/v1/orders", "POST")
        .await
        .unwrap();
    assert!(matches!(check, KeyCheck::Replay(_)));
}
