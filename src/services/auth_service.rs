use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        ChangeEmailRequest, Claims, LoginRequest, LoginResponse, RegisterRequest,
        ResetPasswordRequest,
    },
    entity::{
        restaurants::Entity as Restaurants,
        user_profiles::{
            ActiveModel as UserActive, Column as UserCol, Entity as UserProfiles,
            Model as UserModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{UserProfile, UserRole},
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Staff provisioning. There is no self-service signup: a tenant admin
/// creates accounts for their own restaurant, a master for any restaurant.
pub async fn register_user(
    state: &AppState,
    user: &AuthUser,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let RegisterRequest {
        name,
        email,
        password,
        restaurant_id,
        role,
    } = payload;

    let role = role.unwrap_or(UserRole::Cashier);
    if role == UserRole::Master {
        // Master accounts are provisioned out of band, never via the API.
        return Err(AppError::Forbidden);
    }

    if user.role != UserRole::Master {
        authorize(user, Permission::ManageStaff)?;
        if tenant_of(user)? != restaurant_id {
            return Err(AppError::Forbidden);
        }
    }

    let restaurant = Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?;
    if restaurant.is_none() {
        return Err(AppError::BadRequest("Unknown restaurant".into()));
    }

    let exists = UserProfiles::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let created = UserActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(Some(restaurant_id)),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_register",
        Some("user_profiles"),
        Some(serde_json::json!({ "user_id": created.id, "restaurant_id": restaurant_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    Ok(ApiResponse::success(
        "User created",
        profile_from_entity(created),
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = UserProfiles::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    verify_password(&password, &user.password_hash)?;

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        tenant: user.restaurant_id,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("user_profiles"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Self-service email change; the current password re-proves identity.
pub async fn change_email(
    state: &AppState,
    user: &AuthUser,
    payload: ChangeEmailRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let existing = UserProfiles::find_by_id(user.user_id)
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    verify_password(&payload.password, &existing.password_hash)?;

    let taken = UserProfiles::find()
        .filter(UserCol::Email.eq(payload.new_email.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email is already taken".into()));
    }

    let mut active: UserActive = existing.into();
    active.email = Set(payload.new_email);
    let updated = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "email_change",
        Some("user_profiles"),
        Some(serde_json::json!({ "user_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Email updated",
        profile_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Master-only password reset for any account.
pub async fn reset_password(
    state: &AppState,
    user: &AuthUser,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    authorize(user, Permission::MasterConsole)?;

    let target = UserProfiles::find_by_id(payload.user_id)
        .one(&state.orm)
        .await?;
    let target = match target {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let password_hash = hash_password(&payload.new_password)?;
    let mut active: UserActive = target.into();
    active.password_hash = Set(password_hash);
    let updated = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "password_reset",
        Some("user_profiles"),
        Some(serde_json::json!({ "target_user_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password reset",
        profile_from_entity(updated),
        Some(Meta::empty()),
    ))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::BadRequest("Invalid email or password".into()))
}

pub(crate) fn profile_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
