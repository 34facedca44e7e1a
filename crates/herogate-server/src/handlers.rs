use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;

use herogate_core::{HeroListing, HeroView};

use crate::auth::AuthOutcome;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct HeroListResponse {
    heroes: HeroListing,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Herogate",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

/// GET /heroes returns the roster, enriched when the gate authenticated the
/// caller. Errors pass through untouched; translation lives in the service.
pub async fn list_heroes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthOutcome>,
) -> Result<Json<HeroListResponse>, ApiError> {
    let heroes = state.service.list_heroes(auth.is_authenticated()).await?;
    Ok(Json(HeroListResponse { heroes }))
}

/// GET /heroes/{hero_id} returns a single hero.
pub async fn get_hero(
    State(state): State<AppState>,
    Path(hero_id): Path<String>,
    Extension(auth): Extension<AuthOutcome>,
) -> Result<Json<HeroView>, ApiError> {
    let hero = state
        .service
        .get_hero(&hero_id, auth.is_authenticated())
        .await?;
    Ok(Json(hero))
}
