// src/bin/api_server.rs

use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use web_widget::transport;
use web_widget::{logging, Config, DataLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init_tracing()?;
    tracing::info!(
        mode = ?config.mode,
        connect_timeout = ?config.connect_timeout,
        command_timeout = ?config.command_timeout,
        "> Configuration loaded"
    );

    // --- Data Layer Initialization ---
    let data_layer = DataLayer::from_config(&config)?;
    // Reachability is reported, not required: every request opens its own connection anyway.
    match web_widget::WidgetStore::ping(&data_layer).await {
        Ok(()) => tracing::info!("> Database reachable."),
        Err(e) => tracing::warn!(error = %e, "> Database not reachable at startup (continuing)."),
    }

    let app_state = transport::http::AppState::new(data_layer);

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("> API server listening on http://{}", config.bind_addr);
    tracing::info!("> Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C; shutdown only by kill");
                std::future::pending::<()>().await;
            }
            tracing::info!("> Shutdown signal received (Ctrl+C), draining in-flight requests...");
        })
        .await?;

    tracing::info!("> Graceful shutdown complete.");
    Ok(())
}
