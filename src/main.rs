use api_rest::{router, AppState};
use summary_core::{SummaryConfig, SummaryEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EHR summary service
///
/// Resolves configuration once, builds the summary engine and serves the REST API until the
/// process receives Ctrl-C.
///
/// # Environment Variables
/// - `EHR_SUMMARY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EHR_SUMMARY_GENERATOR`: `template` (default) or `remote`
/// - `EHR_SUMMARY_LLM_URL`, `EHR_SUMMARY_LLM_MODEL`, `EHR_SUMMARY_LLM_API_KEY`,
///   `EHR_SUMMARY_LLM_TIMEOUT_SECS`: remote generator settings
/// - `EHR_SUMMARY_CACHE_CAPACITY`: cached summaries, 0 disables the cache (default: 256)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ehr_summary_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = SummaryConfig::from_env()?;
    let engine = SummaryEngine::from_config(&cfg)?;

    tracing::info!("++ Starting EHR summary REST on {}", cfg.rest_addr());
    tracing::info!(
        "++ Narrative generator: {}, cache capacity: {}",
        engine.generator_id(),
        cfg.cache_capacity()
    );

    let app = router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
