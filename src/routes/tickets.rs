use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::tickets::{CreateTicketRequest, TicketList, TransitionTicketRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Ticket,
    response::ApiResponse,
    routes::params::TicketListQuery,
    services::ticket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/{id}/status", post(transition_ticket))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("restaurant_id" = Option<Uuid>, Query, description = "Master only: filter by tenant")
    ),
    responses(
        (status = 200, description = "Tickets; master sees every tenant", body = ApiResponse<TicketList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_tickets(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 200, description = "Open ticket", body = ApiResponse<Ticket>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let resp = ticket_service::create_ticket(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/status",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = TransitionTicketRequest,
    responses(
        (status = 200, description = "Advance ticket one lifecycle step", body = ApiResponse<Ticket>),
        (status = 400, description = "Illegal transition"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn transition_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionTicketRequest>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let resp = ticket_service::transition_ticket(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
