use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::SkillError;
use crate::config::SkillConfig;
use crate::models::{RequestEnvelope, ResponseEnvelope};
use crate::skill::AirQualitySkill;
use crate::speech::phrases::SKILL_NAME;

/// Routes for the skill endpoint and liveness check
pub fn router(skill: Arc<AirQualitySkill>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/alexa", post(handle_skill_request))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(skill)
}

pub async fn run(config: SkillConfig) -> Result<()> {
    let skill = Arc::new(AirQualitySkill::new(&config)?);
    let app = router(skill, config.server.max_body_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Skill endpoint listening on http://{}/alexa", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn handle_skill_request(
    State(skill): State<Arc<AirQualitySkill>>,
    payload: std::result::Result<Json<RequestEnvelope>, JsonRejection>,
) -> std::result::Result<Json<ResponseEnvelope>, SkillError> {
    let Json(envelope) = payload.map_err(|e| SkillError::invalid_request(e.body_text()))?;
    let response = skill.execute(envelope).await?;
    Ok(Json(response))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "skill": SKILL_NAME,
        "version": crate::VERSION,
    }))
}
