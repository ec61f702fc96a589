use std::{rc::Rc, sync::Arc};

use actix_http::h1;
use actix_web::{
    body,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    http::{header::ContentType, Method, StatusCode},
    web, Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use mirror_sync_logic::{
    idempotency::{
        self, body_fingerprint, CapturedResponse, KeyCheck, IDEMPOTENCY_KEY_HEADER,
    },
    settings::IdempotencySettings,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

/// Middleware making mutating endpoints safe to retry. A POST/PUT request
/// carrying an `x-idempotency-key` header gets its response captured; a
/// repeat of the same key with the same body replays that response without
/// re-executing the handler, and a repeat with a different body is rejected
/// with a conflict. Requests without the header pass through untouched unless
/// the guard is built with `require_key`.
#[derive(Clone)]
pub struct IdempotencyGuard {
    db: Arc<DatabaseConnection>,
    settings: IdempotencySettings,
    require_key: bool,
}

impl IdempotencyGuard {
    pub fn new(db: Arc<DatabaseConnection>, settings: IdempotencySettings) -> Self {
        Self {
            db,
            settings,
            require_key: false,
        }
    }

    /// Makes the key header mandatory: requests without it get a 400 instead
    /// of passing through.
    pub fn require_key(mut self) -> Self {
        self.require_key = true;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdempotencyGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: body::MessageBody + 'static,
{
    type Response = ServiceResponse<body::BoxBody>;
    type Error = Error;
    type Transform = IdempotencyMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdempotencyMiddleware {
            service: Rc::new(service),
            db: self.db.clone(),
            settings: self.settings.clone(),
            require_key: self.require_key,
        })
    }
}

pub struct IdempotencyMiddleware<S> {
    service: Rc<S>,
    db: Arc<DatabaseConnection>,
    settings: IdempotencySettings,
    require_key: bool,
}

impl<S, B> Service<ServiceRequest> for IdempotencyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: body::MessageBody + 'static,
{
    type Response = ServiceResponse<body::BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let db = self.db.clone();
        let settings = self.settings.clone();
        let require_key = self.require_key;

        Box::pin(async move {
            if req.method() != Method::POST && req.method() != Method::PUT {
                return service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_boxed_body);
            }

            let key = req
                .headers()
                .get(IDEMPOTENCY_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let Some(key) = key else {
                if require_key {
                    let response = HttpResponse::BadRequest().json(json!({
                        "code": "MISSING_IDEMPOTENCY_KEY",
                        "message": format!("the {IDEMPOTENCY_KEY_HEADER} header is required"),
                    }));
                    return Ok(req.into_response(response).map_into_boxed_body());
                }
                return service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_boxed_body);
            };

            if key.len() < settings.min_key_length {
                let response = HttpResponse::BadRequest().json(json!({
                    "code": "INVALID_IDEMPOTENCY_KEY",
                    "message": format!(
                        "idempotency key must be at least {} characters long",
                        settings.min_key_length
                    ),
                }));
                return Ok(req.into_response(response).map_into_boxed_body());
            }

            let bytes = req.extract::<web::Bytes>().await?;
            let body_hash = body_fingerprint(&bytes);
            let path = req.path().to_string();
            let method = req.method().to_string();
            reinject_body(&mut req, bytes);

            match idempotency::check(&db, &key, &body_hash, &path, &method).await {
                Ok(KeyCheck::Miss) => {}
                Ok(KeyCheck::Replay(record)) => {
                    tracing::debug!(key = %key, path = %path, "replaying stored response");
                    let status = StatusCode::from_u16(record.status_code as u16)
                        .unwrap_or(StatusCode::OK);
                    let response = HttpResponse::build(status)
                        .content_type(ContentType::json())
                        .body(record.response_body);
                    return Ok(req.into_response(response).map_into_boxed_body());
                }
                Ok(KeyCheck::Conflict(_)) => {
                    tracing::warn!(key = %key, path = %path, "idempotency key reused with a different request");
                    let response = HttpResponse::Conflict().json(json!({
                        "code": "IDEMPOTENCY_KEY_REUSE",
                        "message": "idempotency key was already used with a different request body",
                    }));
                    return Ok(req.into_response(response).map_into_boxed_body());
                }
                Err(err) => {
                    // Availability over strict exactly-once: run the handler
                    // without protection rather than failing the request.
                    tracing::error!(key = %key, error = ?err, "idempotency lookup failed, proceeding unprotected");
                    return service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_boxed_body);
                }
            }

            let response = service.call(req).await?;
            let (req, response) = response.into_parts();
            let (response, response_body) = response.into_parts();
            let bytes = body::to_bytes(response_body)
                .await
                .map_err(|_| ErrorInternalServerError("failed to buffer response body"))?;

            let captured = CapturedResponse {
                key,
                body_hash,
                path,
                method,
                body: String::from_utf8_lossy(&bytes).to_string(),
                status_code: response.status().as_u16(),
                user_id: None,
            };
            let ttl = settings.ttl;
            // Persist off the request path so the client is not kept waiting.
            tokio::spawn(async move {
                if let Err(err) = idempotency::store(&db, captured, ttl).await {
                    tracing::error!(error = ?err, "failed to store idempotency record");
                }
            });

            let response = response.set_body(bytes).map_into_boxed_body();
            Ok(ServiceResponse::new(req, response))
        })
    }
}

/// Puts the buffered body back so the downstream handler can read it again.
fn reinject_body(req: &mut ServiceRequest, bytes: web::Bytes) {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(bytes);
    req.set_payload(payload.into());
}
