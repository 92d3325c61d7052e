use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::tables::{CreateTableRequest, TableList, UpdateTableStatusRequest},
    entity::dining_tables::{
        ActiveModel as TableActive, Column as TableCol, Entity as DiningTables,
        Model as TableModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::DiningTable,
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_tables(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<TableList>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;

    let items = DiningTables::find()
        .filter(TableCol::RestaurantId.eq(restaurant_id))
        .order_by_asc(TableCol::Number)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(table_from_entity)
        .collect();

    Ok(ApiResponse::success("Ok", TableList { items }, Some(Meta::empty())))
}

pub async fn create_table(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTableRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    if payload.number <= 0 {
        return Err(AppError::BadRequest("Table number must be positive".into()));
    }

    let exists = DiningTables::find()
        .filter(
            Condition::all()
                .add(TableCol::RestaurantId.eq(restaurant_id))
                .add(TableCol::Number.eq(payload.number)),
        )
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Table number already exists".into()));
    }

    let table = TableActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        number: Set(payload.number),
        seats: Set(payload.seats.unwrap_or(4)),
        status: Set(crate::models::TableStatus::Available),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Table created",
        table_from_entity(table),
        Some(Meta::empty()),
    ))
}

/// Manual override; order capture and terminal transitions also move
/// table status automatically.
pub async fn set_table_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTableStatusRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    authorize(user, Permission::TransitionOrders)?;
    let restaurant_id = tenant_of(user)?;

    let table = find_tenant_table(state, restaurant_id, id).await?;
    let mut active: TableActive = table.into();
    active.status = Set(payload.status);
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Table updated",
        table_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DiningTable>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    let table = find_tenant_table(state, restaurant_id, id).await?;
    let snapshot = table_from_entity(table.clone());
    table.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Table deleted",
        snapshot,
        Some(Meta::empty()),
    ))
}

async fn find_tenant_table(
    state: &AppState,
    restaurant_id: Uuid,
    id: Uuid,
) -> AppResult<TableModel> {
    let table = DiningTables::find()
        .filter(
            Condition::all()
                .add(TableCol::Id.eq(id))
                .add(TableCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    match table {
        Some(t) => Ok(t),
        None => Err(AppError::NotFound),
    }
}

pub(crate) fn table_from_entity(model: TableModel) -> DiningTable {
    DiningTable {
        id: model.id,
        restaurant_id: model.restaurant_id,
        number: model.number,
        seats: model.seats,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
