use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::restaurants::{
        CreateRestaurantRequest, RestaurantList, UpdatePlanRequest, UpdateRestaurantStatusRequest,
    },
    entity::restaurants::{
        ActiveModel as RestaurantActive, Column as RestaurantCol, Entity as Restaurants,
        Model as RestaurantModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PlanType, Restaurant, RestaurantStatus},
    policy::{Permission, authorize},
    response::{ApiResponse, Meta},
    routes::params::RestaurantListQuery,
    state::AppState,
};

pub async fn list_restaurants(
    state: &AppState,
    user: &AuthUser,
    query: RestaurantListQuery,
) -> AppResult<ApiResponse<RestaurantList>> {
    authorize(user, Permission::MasterConsole)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(RestaurantCol::Status.eq(status));
    }

    let finder = Restaurants::find()
        .filter(condition)
        .order_by_desc(RestaurantCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(restaurant_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", RestaurantList { items }, Some(meta)))
}

/// New tenants start pending; a status update activates them.
pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    authorize(user, Permission::MasterConsole)?;

    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::BadRequest("Name and slug are required".into()));
    }
    let slug = payload.slug.to_lowercase();
    if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::BadRequest(
            "Slug may only contain letters, digits and hyphens".into(),
        ));
    }

    let taken = Restaurants::find()
        .filter(RestaurantCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Slug is already taken".into()));
    }

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(slug),
        status: Set(RestaurantStatus::Pending),
        plan_type: Set(payload.plan_type.unwrap_or(PlanType::Basic)),
        plan_expires_at: Set(None),
        phone: Set(payload.phone),
        address: Set(payload.address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "restaurant_created",
        Some("restaurants"),
        Some(serde_json::json!({ "restaurant_id": restaurant.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Restaurant created",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn get_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Restaurant>> {
    authorize(user, Permission::MasterConsole)?;
    let restaurant = Restaurants::find_by_id(id).one(&state.orm).await?;
    match restaurant {
        Some(r) => Ok(ApiResponse::success(
            "OK",
            restaurant_from_entity(r),
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}

/// Status flags are free-form for the console (active/pending/expired/
/// blocked); gating happens at order capture and public checkout.
pub async fn set_restaurant_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRestaurantStatusRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    authorize(user, Permission::MasterConsole)?;

    let restaurant = Restaurants::find_by_id(id).one(&state.orm).await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let from = restaurant.status;
    let mut active: RestaurantActive = restaurant.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let restaurant = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "restaurant_status_update",
        Some("restaurants"),
        Some(serde_json::json!({
            "restaurant_id": restaurant.id,
            "from": from,
            "to": restaurant.status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Restaurant updated",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn set_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePlanRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    authorize(user, Permission::MasterConsole)?;

    let restaurant = Restaurants::find_by_id(id).one(&state.orm).await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let mut active: RestaurantActive = restaurant.into();
    active.plan_type = Set(payload.plan_type);
    active.plan_expires_at = Set(payload.plan_expires_at.map(Into::into));
    active.updated_at = Set(Utc::now().into());
    let restaurant = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Plan updated",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

pub(crate) fn restaurant_from_entity(model: RestaurantModel) -> Restaurant {
    Restaurant {
        id: model.id,
        name: model.name,
        slug: model.slug,
        status: model.status,
        plan_type: model.plan_type,
        plan_expires_at: model.plan_expires_at.map(|dt| dt.with_timezone(&Utc)),
        phone: model.phone,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
