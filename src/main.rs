use std::sync::Arc;

use anyhow::Context;

use bookly_kernel::settings::Settings;
use bookly_kernel::{InitCtx, ModuleRegistry};
use bookly_mail::MailClient;

use bookly_app::modules;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Bookly settings")?;
    bookly_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "bookly-app bootstrap starting"
    );

    let mail = Arc::new(
        MailClient::new(&settings.mail).with_context(|| "failed to construct mail client")?,
    );

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, mail);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookly-app bootstrap complete");

    bookly_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;
    Ok(())
}
