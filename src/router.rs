use crate::converters::conversation::build_request;
use crate::error::RelayError;
use crate::models::{GenerateRequest, GenerateResponse};
use crate::request_id::{RequestId, inject_request_id};
use crate::state::AppState;
use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/health", get(|| async { "OK" }))
        .layer(axum::middleware::from_fn(inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[axum_macros::debug_handler]
pub async fn generate(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, RelayError> {
    // One consistent snapshot per request, even across a config reload
    let (provider, prompt_settings) = {
        let config = app_state.config.read().await;
        (config.provider.clone(), config.prompt.clone())
    };

    if provider.api_key().is_none() {
        error!("Provider API key is not configured");
        return Err(RelayError::MissingApiKey);
    }

    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        RelayError::from(rejection)
    })?;

    info!(
        "Generate request: history={} prompt_chars={}",
        request.history.len(),
        request.prompt.chars().count()
    );

    let payload = build_request(&request.history, &request.prompt, &prompt_settings);
    debug!("Built conversation with {} turns", payload.contents.len());

    match app_state.llm_client.generate(&provider, &payload, &request_id).await {
        Ok(reply) => {
            info!("Generation succeeded: reply_chars={}", reply.chars().count());
            Ok(Json(GenerateResponse { reply }))
        }
        Err(e) => {
            warn!("Generation failed ({}): {}", e.code(), e);
            Err(e)
        }
    }
}
