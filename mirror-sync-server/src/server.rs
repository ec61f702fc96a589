use std::sync::Arc;

use blockscout_service_launcher::{database, launcher, launcher::LaunchSettings};
use migration::Migrator;
use mirror_sync_logic::{
    client::MirrorClient, idempotency, settings::IdempotencySettings, worker::MirrorWorker,
};
use sea_orm::DatabaseConnection;

use crate::{middleware::IdempotencyGuard, services, settings::Settings};

const SERVICE_NAME: &str = "mirror_sync";

#[derive(Clone)]
struct Router {
    db: Arc<DatabaseConnection>,
    worker: Arc<MirrorWorker>,
    idempotency: IdempotencySettings,
}

impl Router {
    pub fn grpc_router(&self) -> tonic::transport::server::Router {
        let (_, health_service) = tonic_health::server::health_reporter();
        tonic::transport::Server::builder().add_service(health_service)
    }
}

impl launcher::HttpRouter for Router {
    fn register_routes(&self, service_config: &mut actix_web::web::ServiceConfig) {
        service_config
            .app_data(actix_web::web::Data::new(self.worker.clone()))
            .route("/health", actix_web::web::get().to(services::health::health))
            .service(
                actix_web::web::scope("/api/v1")
                    .wrap(IdempotencyGuard::new(
                        self.db.clone(),
                        self.idempotency.clone(),
                    ))
                    .route(
                        "/worker/status",
                        actix_web::web::get().to(services::worker::status),
                    )
                    .route(
                        "/worker/start",
                        actix_web::web::post().to(services::worker::start),
                    )
                    .route(
                        "/worker/stop",
                        actix_web::web::post().to(services::worker::stop),
                    ),
            );
    }
}

pub async fn run(settings: Settings) -> Result<(), anyhow::Error> {
    let db = Arc::new(database::initialize_postgres::<Migrator>(&settings.database).await?);

    let client = MirrorClient::new(settings.mirror_node.clone());
    let worker = Arc::new(MirrorWorker::new(
        db.clone(),
        client,
        settings.worker.clone(),
    ));
    if settings.worker.start_on_launch && !settings.worker.topics.is_empty() {
        worker.start().await?;
    }

    idempotency::spawn_sweeper(db.clone(), settings.idempotency.sweep_interval);

    let router = Router {
        db,
        worker,
        idempotency: settings.idempotency.clone(),
    };

    let grpc_router = router.grpc_router();
    let http_router = router;

    let launch_settings = LaunchSettings {
        service_name: SERVICE_NAME.to_string(),
        server: settings.server,
        metrics: settings.metrics,
        graceful_shutdown: Default::default(),
    };

    launcher::launch(launch_settings, http_router, grpc_router).await
}
