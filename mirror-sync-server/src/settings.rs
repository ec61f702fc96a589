use blockscout_service_launcher::{
    database::{DatabaseConnectSettings, DatabaseSettings},
    launcher::{ConfigSettings, MetricsSettings, ServerSettings},
    tracing::{JaegerSettings, TracingSettings},
};
use mirror_sync_logic::{
    client::settings::MirrorNodeSettings,
    settings::{IdempotencySettings, WorkerSettings},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub tracing: TracingSettings,
    #[serde(default)]
    pub jaeger: JaegerSettings,

    pub database: DatabaseSettings,
    #[serde(default)]
    pub mirror_node: MirrorNodeSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub idempotency: IdempotencySettings,
}

impl ConfigSettings for Settings {
    const SERVICE_NAME: &'static str = "MIRROR_SYNC";
}

impl Settings {
    pub fn default(database_url: String) -> Self {
        Self {
            server: Default::default(),
            metrics: Default::default(),
            tracing: Default::default(),
            jaeger: Default::default(),
            database: DatabaseSettings {
                connect: DatabaseConnectSettings::Url(database_url),
                connect_options: Default::default(),
                create_database: Default::default(),
                run_migrations: Default::default(),
            },
            mirror_node: Default::default(),
            worker: Default::default(),
            idempotency: Default::default(),
        }
    }
}
