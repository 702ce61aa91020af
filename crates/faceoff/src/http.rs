//! HTTP API: room creation and lookup, stats, and a health probe.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use faceoff_game::CategorySource;
use faceoff_protocol::RoomCode;
use faceoff_room::{RoomError, RoomRegistry};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

type Registry<C> = Arc<RoomRegistry<C>>;

pub(crate) fn router<C: CategorySource>(registry: Registry<C>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/rooms", post(create_room_handler::<C>))
        .route("/api/rooms/:code", get(get_room_handler::<C>))
        .route("/api/stats", get(stats_handler::<C>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    #[serde(default)]
    host_name: Option<String>,
}

async fn create_room_handler<C: CategorySource>(
    State(registry): State<Registry<C>>,
    payload: Option<Json<CreateRoomRequest>>,
) -> Response {
    let Some(host_name) = payload.and_then(|Json(body)| body.host_name) else {
        return failure(StatusCode::BAD_REQUEST, "hostName is required");
    };
    match registry.create_room(&host_name).await {
        Ok(room) => {
            let message = format!("Room {} created", room.code);
            Json(json!({ "success": true, "room": room, "message": message })).into_response()
        }
        Err(e) => room_failure(&e),
    }
}

async fn get_room_handler<C: CategorySource>(
    State(registry): State<Registry<C>>,
    Path(code): Path<String>,
) -> Response {
    let Ok(code) = RoomCode::parse(&code) else {
        return failure(StatusCode::NOT_FOUND, "Room not found");
    };
    match registry.get_room(&code).await {
        Some(room) => Json(room).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Room not found"),
    }
}

async fn stats_handler<C: CategorySource>(State(registry): State<Registry<C>>) -> Response {
    Json(registry.stats().await).into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

fn room_failure(err: &RoomError) -> Response {
    let status = StatusCode::from_u16(err.kind().status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(error = %err, "room request failed");
    }
    failure(status, &err.client_message())
}
