//! campaign-tracker server entry point.
//!
//! Starts the Axum HTTP server with tracking, reporting, and WebSocket
//! endpoints.

use tracing_subscriber::EnvFilter;

use campaign_tracker::config::{LogFormat, TrackerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = TrackerConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        max_events_per_campaign = config.max_events_per_campaign,
        max_campaigns = config.max_campaigns,
        "starting campaign-tracker"
    );

    let state = campaign_tracker::build_state(&config);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        campaign_tracker::app(state).merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", campaign_tracker::api::openapi::ApiDoc::openapi()),
        )
    };
    #[cfg(not(feature = "swagger-ui"))]
    let app = campaign_tracker::app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
