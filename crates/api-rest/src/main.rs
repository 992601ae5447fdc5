//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging of the HTTP surface. The workspace's main
//! `ehr-summary-run` binary serves the same router.

use api_rest::{router, AppState};
use summary_core::{SummaryConfig, SummaryEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EHR summary REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `EHR_SUMMARY_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `EHR_SUMMARY_GENERATOR` and the `EHR_SUMMARY_LLM_*` variables: narrative generator
/// - `EHR_SUMMARY_CACHE_CAPACITY`: cached summaries, 0 disables the cache
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = SummaryConfig::from_env()?;
    let engine = SummaryEngine::from_config(&cfg)?;

    tracing::info!("-- Starting EHR summary REST API on {}", cfg.rest_addr());
    tracing::info!("-- Narrative generator: {}", engine.generator_id());

    let app = router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
