use std::sync::Arc;

use actix_web::{web, HttpResponse};
use mirror_sync_logic::worker::MirrorWorker;
use serde_json::json;

pub async fn status(worker: web::Data<Arc<MirrorWorker>>) -> HttpResponse {
    HttpResponse::Ok().json(worker.status().await)
}

pub async fn start(worker: web::Data<Arc<MirrorWorker>>) -> HttpResponse {
    match worker.get_ref().start().await {
        Ok(true) => HttpResponse::Ok().json(json!({ "message": "worker started" })),
        Ok(false) => HttpResponse::Ok().json(json!({ "message": "worker is already running" })),
        Err(err) => {
            tracing::error!(error = ?err, "failed to start mirror worker");
            HttpResponse::InternalServerError().json(json!({
                "code": "WORKER_START_FAILED",
                "message": "failed to start the mirror worker",
            }))
        }
    }
}

pub async fn stop(worker: web::Data<Arc<MirrorWorker>>) -> HttpResponse {
    if worker.stop().await {
        HttpResponse::Ok().json(json!({ "message": "worker stopping" }))
    } else {
        HttpResponse::Ok().json(json!({ "message": "worker is not running" }))
    }
}
