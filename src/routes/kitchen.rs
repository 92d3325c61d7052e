use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::KitchenQueue,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/queue", get(queue))
}

#[utoipa::path(
    get,
    path = "/api/kitchen/queue",
    responses(
        (status = 200, description = "Pending, preparing and ready queues, oldest first", body = ApiResponse<KitchenQueue>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Kitchen"
)]
pub async fn queue(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<KitchenQueue>>> {
    let resp = order_service::kitchen_queue(&state, &user).await?;
    Ok(Json(resp))
}
