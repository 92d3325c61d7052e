use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::restaurants::{
        CreateRestaurantRequest, RestaurantList, UpdatePlanRequest, UpdateRestaurantStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Restaurant,
    response::ApiResponse,
    routes::params::RestaurantListQuery,
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants).post(create_restaurant))
        .route("/restaurants/{id}", get(get_restaurant))
        .route("/restaurants/{id}/status", patch(set_restaurant_status))
        .route("/restaurants/{id}/plan", patch(set_plan))
}

#[utoipa::path(
    get,
    path = "/api/master/restaurants",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "All tenant restaurants (master only)", body = ApiResponse<RestaurantList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Master"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RestaurantListQuery>,
) -> AppResult<Json<ApiResponse<RestaurantList>>> {
    let resp = restaurant_service::list_restaurants(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/master/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 200, description = "Create tenant (starts pending)", body = ApiResponse<Restaurant>),
        (status = 400, description = "Invalid or duplicate slug"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Master"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::create_restaurant(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/master/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Tenant detail", body = ApiResponse<Restaurant>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Master"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::get_restaurant(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/master/restaurants/{id}/status",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = UpdateRestaurantStatusRequest,
    responses(
        (status = 200, description = "Set tenant status flag", body = ApiResponse<Restaurant>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Master"
)]
pub async fn set_restaurant_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRestaurantStatusRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::set_restaurant_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/master/restaurants/{id}/plan",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Set tenant plan", body = ApiResponse<Restaurant>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Master"
)]
pub async fn set_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::set_plan(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
