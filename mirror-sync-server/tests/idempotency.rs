use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use actix_web::{test, web, App, HttpResponse};
use blockscout_service_launcher::test_database::TestDbGuard;
use mirror_sync_logic::settings::IdempotencySettings;
use mirror_sync_server::middleware::IdempotencyGuard;
use pretty_assertions::assert_eq;
use sea_orm::ConnectionTrait;
use serde_json::json;

async fn init_db(test_name: &str) -> TestDbGuard {
    TestDbGuard::new::<migration::Migrator>(test_name).await
}

async fn create_order(
    counter: web::Data<AtomicU32>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    HttpResponse::Created().json(json!({ "id": format!("ord-{n}"), "echo": body.into_inner() }))
}

macro_rules! init_app {
    ($db:expr, $counter:expr, $guard:expr) => {
        test::init_service(
            App::new().app_data($counter.clone()).service(
                web::scope("/api/v1")
                    .wrap($guard)
                    .route("/orders", web::post().to(create_order)),
            ),
        )
        .await
    };
}

fn order_request(key: &str, body: serde_json::Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(("x-idempotency-key", key))
        .set_json(body)
}

// The store write happens off the request path.
async fn wait_for_persistence() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[actix_web::test]
async fn duplicate_request_replays_response_and_runs_handler_once() {
    let db = init_db("server_idempotency_replay").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard = IdempotencyGuard::new(db.client(), IdempotencySettings::default());
    let app = init_app!(db, counter, guard);

    let body = json!({ "lotId": "l1", "amount": 10 });
    let first = test::call_service(
        &app,
        order_request("key-aaaaaaaaaaaaaaaa", body.clone()).to_request(),
    )
    .await;
    assert_eq!(first.status(), 201);
    let first_body = test::read_body(first).await;

    wait_for_persistence().await;

    let second = test::call_service(
        &app,
        order_request("key-aaaaaaaaaaaaaaaa", body).to_request(),
    )
    .await;
    assert_eq!(second.status(), 201);
    let second_body = test::read_body(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn key_reuse_with_different_body_is_rejected() {
    let db = init_db("server_idempotency_conflict").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard = IdempotencyGuard::new(db.client(), IdempotencySettings::default());
    let app = init_app!(db, counter, guard);

    let first = test::call_service(
        &app,
        order_request("key-bbbbbbbbbbbbbbbb", json!({ "amount": 10 })).to_request(),
    )
    .await;
    assert_eq!(first.status(), 201);

    wait_for_persistence().await;

    let second = test::call_service(
        &app,
        order_request("key-bbbbbbbbbbbbbbbb", json!({ "amount": 99 })).to_request(),
    )
    .await;
    assert_eq!(second.status(), 409);
    let error: serde_json::Value = test::read_body_json(second).await;
    assert_eq!(error["code"], "IDEMPOTENCY_KEY_REUSE");

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn requests_without_key_pass_through() {
    let db = init_db("server_idempotency_passthrough").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard = IdempotencyGuard::new(db.client(), IdempotencySettings::default());
    let app = init_app!(db, counter, guard);

    for _ in 0..2 {
        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/orders")
                .set_json(json!({ "amount": 10 }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 201);
    }

    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn short_key_is_rejected_before_the_handler() {
    let db = init_db("server_idempotency_short_key").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard = IdempotencyGuard::new(db.client(), IdempotencySettings::default());
    let app = init_app!(db, counter, guard);

    let response = test::call_service(
        &app,
        order_request("short", json!({ "amount": 10 })).to_request(),
    )
    .await;
    assert_eq!(response.status(), 400);
    let error: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(error["code"], "INVALID_IDEMPOTENCY_KEY");

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn missing_key_is_rejected_when_required() {
    let db = init_db("server_idempotency_required_key").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard =
        IdempotencyGuard::new(db.client(), IdempotencySettings::default()).require_key();
    let app = init_app!(db, counter, guard);

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(json!({ "amount": 10 }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), 400);
    let error: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(error["code"], "MISSING_IDEMPOTENCY_KEY");

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn storage_fault_falls_through_to_plain_handling() {
    let db = init_db("server_idempotency_storage_fault").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let guard = IdempotencyGuard::new(db.client(), IdempotencySettings::default());
    let app = init_app!(db, counter, guard);

    // Break the key lookup entirely; the request must still reach the
    // handler, now without replay protection.
    db.client()
        .execute_unprepared("DROP TABLE idempotency_records")
        .await
        .unwrap();

    let body = json!({ "amount": 10 });
    for _ in 0..2 {
        let response = test::call_service(
            &app,
            order_request("key-gggggggggggggggg", body.clone()).to_request(),
        )
        .await;
        assert_eq!(response.status(), 201);
    }

    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn expired_key_is_processed_as_new() {
    let db = init_db("server_idempotency_expired").await;
    let counter = web::Data::new(AtomicU32::new(0));
    let settings = IdempotencySettings {
        ttl: Duration::ZERO,
        ..Default::default()
    };
    let guard = IdempotencyGuard::new(db.client(), settings);
    let app = init_app!(db, counter, guard);

    let body = json!({ "amount": 10 });
    for _ in 0..2 {
        let response = test::call_service(
            &app,
            order_request("key-cccccccccccccccc", body.clone()).to_request(),
        )
        .await;
        assert_eq!(response.status(), 201);
        wait_for_persistence().await;
    }

    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
