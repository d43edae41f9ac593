use std::sync::Arc;

use axum::Router;
use symptom_intake::config::ServiceConfig;
use symptom_intake::error::Result;
use symptom_intake::model::DiseasePredictor;
use symptom_intake::session::{InMemorySessionStore, SessionAggregator};
use symptom_intake::store::{LibSqlTranscriptLog, TranscriptLog};
use symptom_intake::webhook::webhook_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env()?;

    eprintln!("🩺 Symptom Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model_path.display());
    eprintln!("   Symptom policy: {}", config.symptom_policy);
    eprintln!("   Webhook: http://0.0.0.0:{}/default", config.port);

    let app = build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the model, open the transcript log, and wire the router.
async fn build_app(config: &ServiceConfig) -> Result<Router> {
    // ── Model ───────────────────────────────────────────────────────────
    let predictor = Arc::new(DiseasePredictor::load(&config.model_path)?);
    eprintln!("   Labels: {}", predictor.labels().len());

    // ── Transcripts ─────────────────────────────────────────────────────
    let transcripts: Option<Arc<dyn TranscriptLog>> = if config.transcripts_enabled {
        let log = LibSqlTranscriptLog::new_local(&config.db_path).await?;
        eprintln!("   Transcripts: {}", config.db_path.display());
        Some(Arc::new(log))
    } else {
        eprintln!("   Transcripts: disabled");
        None
    };

    // ── Sessions ────────────────────────────────────────────────────────
    let aggregator = Arc::new(SessionAggregator::new(
        Arc::new(InMemorySessionStore::new()),
        predictor,
        config.symptom_policy,
    ));

    Ok(webhook_routes(aggregator, transcripts))
}
