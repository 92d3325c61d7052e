use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::campaigns::{CampaignList, CreateCampaignRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Campaign,
    response::ApiResponse,
    routes::params::Pagination,
    services::campaign_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_campaigns).post(create_campaign))
        .route("/{id}", delete(delete_campaign))
        .route("/{id}/send", post(send_campaign))
}

#[utoipa::path(
    get,
    path = "/api/campaigns",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Tenant campaigns", body = ApiResponse<CampaignList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Campaigns"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CampaignList>>> {
    let resp = campaign_service::list_campaigns(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 200, description = "Create draft campaign", body = ApiResponse<Campaign>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Campaigns"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCampaignRequest>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let resp = campaign_service::create_campaign(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/send",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Mark campaign sent and snapshot audience size", body = ApiResponse<Campaign>),
        (status = 400, description = "Already sent"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Campaigns"
)]
pub async fn send_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let resp = campaign_service::send_campaign(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Delete draft campaign", body = ApiResponse<Campaign>),
        (status = 400, description = "Sent campaigns cannot be deleted"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Campaigns"
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let resp = campaign_service::delete_campaign(&state, &user, id).await?;
    Ok(Json(resp))
}
