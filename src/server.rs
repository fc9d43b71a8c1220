use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use streaming_providers::{ProviderInfo, Song};
use tower_http::trace::TraceLayer;

use crate::composer::{MessageComposer, ReplyPayload};
use crate::handler::{InboundMessage, MessageHandler};
use crate::resolver::{ResolveError, Resolver};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub handler: Arc<MessageHandler>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub canonical: Song,
    pub alternatives: Vec<Song>,
    pub reply: ReplyPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Set when the link resolved but nothing else carries the song
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<Song>,
}

pub fn create_router(resolver: Arc<Resolver>, handler: Arc<MessageHandler>) -> Router {
    let state = AppState { resolver, handler };

    Router::new()
        .route("/", get(root))
        .route("/providers", get(list_providers))
        .route("/messages", post(handle_message))
        .route("/resolve", post(resolve_link))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> String {
    format!("Miku API v{}", crate::VERSION)
}

async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.resolver.registry().infos())
}

async fn handle_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Response {
    tracing::debug!("Received message {} in channel {}", message.id, message.channel_id);

    match state.handler.handle(&message).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn resolve_link(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::debug!("Resolving {}", request.url);

    let resolution = state.resolver.resolve(&request.url).await.map_err(|e| {
        tracing::debug!("Failed to resolve {}: {}", request.url, e);
        let error = e.to_string();
        match e {
            ResolveError::InvalidUrl { .. } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error, canonical: None }),
            ),
            ResolveError::OriginNotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse { error, canonical: None }),
            ),
            ResolveError::NoAlternativesFound { canonical } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error,
                    canonical: Some(*canonical),
                }),
            ),
        }
    })?;

    let reply = MessageComposer::build(&resolution.canonical, resolution.alternatives(), None);
    let (canonical, alternatives) = resolution.into_parts();

    Ok(Json(ResolveResponse {
        canonical,
        alternatives,
        reply,
    }))
}
