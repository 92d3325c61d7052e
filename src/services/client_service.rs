use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::clients::{ClientList, CreateClientRequest, UpdateClientRequest},
    entity::clients::{
        ActiveModel as ClientActive, Column as ClientCol, Entity as Clients, Model as ClientModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Client,
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_clients(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ClientList>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Clients::find()
        .filter(ClientCol::RestaurantId.eq(restaurant_id))
        .order_by_asc(ClientCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(client_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", ClientList { items }, Some(meta)))
}

pub async fn create_client(
    state: &AppState,
    user: &AuthUser,
    payload: CreateClientRequest,
) -> AppResult<ApiResponse<Client>> {
    authorize(user, Permission::CaptureOrders)?;
    let restaurant_id = tenant_of(user)?;

    if payload.name.trim().is_empty() || payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("Name and phone are required".into()));
    }

    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(payload.name),
        phone: Set(payload.phone),
        email: Set(payload.email),
        address: Set(payload.address),
        loyalty_points: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Client created",
        client_from_entity(client),
        Some(Meta::empty()),
    ))
}

pub async fn update_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateClientRequest,
) -> AppResult<ApiResponse<Client>> {
    authorize(user, Permission::CaptureOrders)?;
    let restaurant_id = tenant_of(user)?;

    let client = find_tenant_client(state, restaurant_id, id).await?;
    let mut active: ClientActive = client.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Client updated",
        client_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Find-or-create used by the public checkout: customers are keyed by
/// phone within a tenant.
pub async fn upsert_by_phone(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    phone: &str,
    email: Option<String>,
    address: Option<String>,
) -> AppResult<ClientModel> {
    let existing = Clients::find()
        .filter(
            Condition::all()
                .add(ClientCol::RestaurantId.eq(restaurant_id))
                .add(ClientCol::Phone.eq(phone)),
        )
        .one(&state.orm)
        .await?;

    if let Some(client) = existing {
        let mut active: ClientActive = client.into();
        active.name = Set(name.to_string());
        if let Some(address) = address {
            active.address = Set(Some(address));
        }
        if let Some(email) = email {
            active.email = Set(Some(email));
        }
        return Ok(active.update(&state.orm).await?);
    }

    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(email),
        address: Set(address),
        loyalty_points: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(client)
}

async fn find_tenant_client(
    state: &AppState,
    restaurant_id: Uuid,
    id: Uuid,
) -> AppResult<ClientModel> {
    let client = Clients::find()
        .filter(
            Condition::all()
                .add(ClientCol::Id.eq(id))
                .add(ClientCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    match client {
        Some(c) => Ok(c),
        None => Err(AppError::NotFound),
    }
}

pub(crate) fn client_from_entity(model: ClientModel) -> Client {
    Client {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        phone: model.phone,
        email: model.email,
        address: model.address,
        loyalty_points: model.loyalty_points,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
