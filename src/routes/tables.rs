use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::tables::{CreateTableRequest, TableList, UpdateTableStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::DiningTable,
    response::ApiResponse,
    services::table_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route("/{id}", axum::routing::delete(delete_table))
        .route("/{id}/status", axum::routing::patch(set_table_status))
}

#[utoipa::path(
    get,
    path = "/api/tables",
    responses(
        (status = 200, description = "Tenant tables ordered by number", body = ApiResponse<TableList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TableList>>> {
    let resp = table_service::list_tables(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Create table", body = ApiResponse<DiningTable>),
        (status = 400, description = "Duplicate table number"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::create_table(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/tables/{id}/status",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = UpdateTableStatusRequest,
    responses(
        (status = 200, description = "Manual table status override", body = ApiResponse<DiningTable>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn set_table_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTableStatusRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::set_table_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Delete table", body = ApiResponse<DiningTable>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::delete_table(&state, &user, id).await?;
    Ok(Json(resp))
}
