use blockscout_service_launcher::launcher::ConfigSettings;
use mirror_sync_server::Settings;

const SERVICE_NAME: &str = "mirror_sync";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = Settings::build().expect("failed to read config");

    blockscout_service_launcher::tracing::init_logs(
        SERVICE_NAME,
        &settings.tracing,
        &settings.jaeger,
    )?;

    mirror_sync_server::run(settings).await
}
