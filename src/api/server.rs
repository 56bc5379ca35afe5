//! HTTP API server
//!
//! Routes chat, feedback, profile, and memory traffic to the engine. Errors
//! map to status codes at this boundary: missing profiles are 404, invalid
//! feedback is 400, everything else is a generic 500.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::context::Context;
use crate::engine::{text_analysis, ToneEngine};
use crate::error::AttuneError;
use crate::types::{
    CommunicationStyle, ContextPreferences, FeedbackPayload, InteractionHistory, TonePreferences,
    UserProfile,
};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 8000).into(),
        }
    }
}

/// API server state
#[derive(Clone)]
struct AppState {
    engine: Arc<ToneEngine>,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    engine: Arc<ToneEngine>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, engine: Arc<ToneEngine>) -> Self {
        Self { config, engine }
    }

    /// Build router
    pub fn build_router(engine: Arc<ToneEngine>) -> Router {
        let state = AppState { engine };
        Router::new()
            // Chat
            .route("/api/chat", post(chat_handler))
            .route("/api/chat/feedback", post(feedback_handler))
            .route("/api/chat/:user_id/memory", get(memory_summary_handler))
            .route("/api/chat/:user_id/memory", delete(clear_memory_handler))
            .route("/api/chat/:user_id/feedback", get(feedback_summary_handler))
            // Profiles
            .route("/api/profile", post(upsert_profile_handler))
            .route("/api/profile/analyze", post(analyze_profile_handler))
            .route("/api/profile/:user_id", get(get_profile_handler))
            .route("/api/profile/:user_id", delete(delete_profile_handler))
            .route("/api/profile", get(list_profiles_handler))
            // Memory inspection
            .route("/api/memory/:user_id", get(memory_summary_handler))
            .route("/api/memory/:user_id", delete(clear_memory_handler))
            .route("/api/memory/:user_id/short-term", get(short_term_handler))
            .route("/api/memory/:user_id/long-term", get(long_term_handler))
            .route("/api/memory/:user_id/analytics", get(analytics_handler))
            // Service info
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving on the configured address
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = Self::build_router(self.engine.clone());
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("API server listening on http://{}", self.config.addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Error wrapper so handlers can use `?` over engine calls
struct ApiError(AttuneError);

impl From<AttuneError> for ApiError {
    fn from(err: AttuneError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            AttuneError::ProfileNotFound(user) => {
                (StatusCode::NOT_FOUND, format!("Profile not found: {user}"))
            }
            AttuneError::InvalidFeedback(msg) | AttuneError::InvalidToneLevel(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    user_id: String,
    message: String,
    context: Option<Context>,
    feedback: Option<FeedbackPayload>,
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .engine
        .handle_message(&req.user_id, &req.message, req.context, req.feedback.as_ref())
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    user_id: String,
    #[serde(flatten)]
    payload: FeedbackPayload,
}

async fn feedback_handler(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.engine.handle_feedback(&req.user_id, &req.payload).await?;
    Ok(Json(json!({
        "message": "Feedback processed successfully",
        "updated_profile": {
            "user_id": updated.user_id,
            "tone_preferences": updated.tone_preferences,
            "interaction_history": updated.interaction_history,
        }
    })))
}

async fn feedback_summary_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    Json(state.engine.ledger().summary(&user_id).await)
}

#[derive(Debug, Deserialize)]
struct ProfileRequest {
    user_id: String,
    tone_preferences: TonePreferences,
    #[serde(default)]
    communication_style: Option<CommunicationStyle>,
    #[serde(default)]
    interaction_history: Option<InteractionHistory>,
    #[serde(default)]
    context_preferences: Option<ContextPreferences>,
}

async fn upsert_profile_handler(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut profile = match state.engine.profiles().get(&req.user_id).await {
        Ok(existing) => existing,
        Err(AttuneError::ProfileNotFound(_)) => UserProfile::new(&req.user_id),
        Err(e) => return Err(e.into()),
    };

    profile.tone_preferences = req.tone_preferences;
    if let Some(style) = req.communication_style {
        profile.communication_style = style;
    }
    if let Some(history) = req.interaction_history {
        profile.interaction_history = history;
    }
    profile.context_preferences = req.context_preferences;
    profile.updated_at = chrono::Utc::now();

    state.engine.profiles().put(&profile).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    user_id: String,
    text: String,
}

/// Infer tone preferences from a writing sample and apply them
async fn analyze_profile_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut profile = state.engine.profiles().get(&req.user_id).await?;
    text_analysis::update_profile_from_text(&mut profile, &req.text);
    state.engine.profiles().put(&profile).await?;
    Ok(Json(profile))
}

async fn get_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.engine.profiles().get(&user_id).await?;
    Ok(Json(profile))
}

async fn delete_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.profiles().delete(&user_id).await?;
    state.engine.forget_user(&user_id).await?;
    Ok(Json(json!({ "message": "Profile deleted", "user_id": user_id })))
}

async fn list_profiles_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.engine.profiles().list().await?;
    Ok(Json(json!({ "users": users })))
}

async fn memory_summary_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.engine.memory().summary(&user_id).await?;
    Ok(Json(json!({
        "user_id": user_id,
        "short_term_count": summary.short_term_count,
        "long_term_size_kb": summary.long_term_size_kb,
        "max_short_term": summary.max_short_term,
        "max_long_term_kb": summary.max_long_term_kb,
        "short_term_memory": summary.short_term_memory,
        "long_term_memory": summary.long_term_memory,
    })))
}

async fn clear_memory_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.forget_user(&user_id).await?;
    Ok(Json(json!({
        "message": "Memory cleared successfully",
        "user_id": user_id,
        "cleared_at": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn short_term_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let entries = state.engine.memory().read_short_term(&user_id).await;
    Json(json!({
        "user_id": user_id,
        "count": entries.len(),
        "short_term_memory": entries,
    }))
}

async fn long_term_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let blob = state.engine.memory().read_long_term(&user_id).await?;
    let size = state.engine.memory().long_term_size(&user_id).await?;
    Ok(Json(json!({
        "user_id": user_id,
        "long_term_memory": blob,
        "size_kb": size as f64 / 1024.0,
    })))
}

async fn analytics_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = state.engine.memory().analytics(&user_id).await?;
    Ok(Json(analytics))
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Personalized Tone Adaptation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "/api/chat",
            "feedback": "/api/chat/feedback",
            "profiles": "/api/profile",
            "memory": "/api/memory/{user_id}",
        }
    }))
}

/// Health check handler
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health_handler().await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_error_mapping() {
        let not_found = ApiError(AttuneError::ProfileNotFound("x".to_string())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad = ApiError(AttuneError::InvalidFeedback("bad".to_string())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let other = ApiError(AttuneError::Other("boom".to_string())).into_response();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
