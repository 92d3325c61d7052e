use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{
        ChangeEmailRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/email", post(change_email))
        .route("/password-reset", post(reset_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Create a staff account (admin for own tenant, master for any)", body = ApiResponse<UserProfile>),
        (status = 400, description = "Unknown restaurant or email taken"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::register_user(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/email",
    request_body = ChangeEmailRequest,
    responses(
        (status = 200, description = "Change own email", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid password or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_email(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangeEmailRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::change_email(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Reset a user's password (master only)", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::reset_password(&state, &user, payload).await?;
    Ok(Json(resp))
}
