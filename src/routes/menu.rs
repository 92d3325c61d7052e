use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::{menu::{DigitalMenu, PublicCheckoutRequest}, orders::OrderDetail},
    error::AppResult,
    response::ApiResponse,
    services::menu_service,
    state::AppState,
};

/// Public routes; no bearer token. Parameterized by restaurant slug.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(digital_menu))
        .route("/{slug}/checkout", post(checkout))
}

#[utoipa::path(
    get,
    path = "/public/menu/{slug}",
    params(("slug" = String, Path, description = "Restaurant slug")),
    responses(
        (status = 200, description = "Digital menu of an active restaurant", body = ApiResponse<DigitalMenu>),
        (status = 404, description = "Unknown or inactive restaurant"),
    ),
    tag = "Public"
)]
pub async fn digital_menu(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<DigitalMenu>>> {
    let resp = menu_service::digital_menu(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/public/menu/{slug}/checkout",
    params(("slug" = String, Path, description = "Restaurant slug")),
    request_body = PublicCheckoutRequest,
    responses(
        (status = 200, description = "Place a takeout/delivery order", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid cart or missing address"),
        (status = 404, description = "Unknown or inactive restaurant"),
    ),
    tag = "Public"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<PublicCheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = menu_service::checkout(&state, &slug, payload).await?;
    Ok(Json(resp))
}
