//! HTTP surface for UI collaborators.

use crate::scheduler::RefreshTrigger;
use crate::sync::{Message, MessageResponse, SyncService};
use axum::{
    extract::{Json as AxumJson, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

struct ApiState {
    service: Arc<SyncService>,
    refresh_trigger: RefreshTrigger,
}

pub fn router(service: Arc<SyncService>, refresh_trigger: RefreshTrigger) -> Router {
    let state = Arc::new(ApiState {
        service,
        refresh_trigger,
    });

    Router::new()
        .route("/api/message", post(handle_message))
        .route("/api/state", get(get_state))
        .route("/api/refresh", post(trigger_refresh))
        .with_state(state)
}

pub async fn start_api_server(
    service: Arc<SyncService>,
    refresh_trigger: RefreshTrigger,
    addr: SocketAddr,
) -> std::io::Result<()> {
    let app = router(service, refresh_trigger);
    tracing::info!("API Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

fn reply(response: MessageResponse) -> (StatusCode, Json<MessageResponse>) {
    let status = if response.ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}

async fn handle_message(
    State(state): State<Arc<ApiState>>,
    AxumJson(message): AxumJson<Message>,
) -> impl IntoResponse {
    reply(state.service.handle(message).await)
}

async fn get_state(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    reply(state.service.handle(Message::GetState).await)
}

async fn trigger_refresh(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let queued = state.refresh_trigger.request();
    Json(serde_json::json!({ "ok": true, "queued": queued }))
}
