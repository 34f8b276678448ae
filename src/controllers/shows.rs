use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::BookingError;
use crate::models::{Show, ShowId};
use crate::services::booking::SeatMap;
use crate::AppState;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows/{id}", get(get_show))
        .route("/shows/{id}/seats", get(get_show_seats))
}

fn json_response(body: String, cache_status: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json"), (X_CACHE, cache_status)],
        body,
    )
        .into_response()
}

// GET /api/shows/{id}/seats
async fn get_show_seats(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<ShowId>,
) -> Result<Response, BookingError> {
    // 1. Пытаемся отдать схему текущей версии из кеша (сеанс должен быть активен)
    if let Some(cache) = &state.cache {
        let version = state.engine.seat_map_version(show_id).await?;
        if let Some(cached) = cache.get(show_id, version).await {
            return Ok(json_response(cached, "HIT"));
        }
    }

    // 2. Cache Miss: строим схему по инвентарю
    let seat_map = state.engine.seat_map(show_id).await?;

    // 3. Сериализуем и сохраняем под версией, с которой схема построена
    match serde_json::to_string(&seat_map) {
        Ok(body) => {
            if let Some(cache) = &state.cache {
                cache.put(show_id, seat_map.version, &body).await;
            }
            Ok(json_response(body, "MISS"))
        }
        Err(e) => {
            tracing::error!(show_id, "failed to serialize seat map: {}", e);
            Ok(Json(seat_map).into_response())
        }
    }
}

#[derive(Debug, Serialize)]
struct ShowDetails {
    show: Show,
    #[serde(flatten)]
    seat_map: SeatMap,
}

// GET /api/shows/{id}
async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<ShowId>,
) -> Result<impl IntoResponse, BookingError> {
    let (show, seat_map) = state.engine.show_details(show_id).await?;
    Ok(Json(ShowDetails { show, seat_map }))
}
