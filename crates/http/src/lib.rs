//! HTTP server facade for Bookly with Axum, error handling, and OpenAPI support.

use std::future::Future;

use anyhow::Context;
use axum::{routing::get, Router};

use bookly_kernel::ModuleRegistry;

pub mod error;
pub mod router;

pub use router::{version_prefix, RouterBuilder, API_VERSION};

/// Start the HTTP server with the given module registry. Returns once a
/// shutdown signal is received so the caller can stop modules.
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &bookly_kernel::settings::Settings,
) -> anyhow::Result<()> {
    run_until(registry, settings, shutdown_signal()).await
}

/// Serve HTTP until the provided shutdown future resolves.
pub async fn run_until(
    registry: &ModuleRegistry,
    settings: &bookly_kernel::settings::Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_router(registry, settings);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            // Keep serving rather than shutting down on a broken signal handler.
            std::future::pending::<()>().await;
        }
    }
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(
    registry: &ModuleRegistry,
    settings: &bookly_kernel::settings::Settings,
) -> Router {
    let mut router_builder = RouterBuilder::new();

    // Global middlewares, registered before any traffic is served
    router_builder = router_builder
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms);

    // Liveness route
    router_builder = router_builder.route("/healthz", get(health_check));

    // Mount module routes under the versioned prefix
    for module in registry.modules() {
        let module_name = module.name();
        let module_router = module.routes();

        tracing::info!(
            module = module_name,
            "mounting module routes under {}/{}",
            version_prefix(),
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module_router);
    }

    // Interactive docs and merged OpenAPI document
    router_builder = router_builder.with_openapi(registry);

    router_builder.build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use bookly_kernel::settings::Settings;

    #[tokio::test]
    async fn run_until_returns_after_shutdown_future_resolves() {
        let registry = ModuleRegistry::new();
        let mut settings = Settings::default();
        settings.server.host = "127.0.0.1".to_string();
        settings.server.port = 0;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            run_until(&registry, &settings, async {
                let _ = shutdown_rx.await;
            })
            .await
        });

        shutdown_tx.send(()).expect("server task dropped receiver");

        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop after shutdown")
            .expect("server task panicked");
        assert!(result.is_ok());
    }
}
