use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::tickets::{CreateTicketRequest, TicketList, TransitionTicketRequest},
    entity::tickets::{
        ActiveModel as TicketActive, Column as TicketCol, Entity as Tickets, Model as TicketModel,
    },
    error::{AppError, AppResult},
    lifecycle,
    middleware::auth::AuthUser,
    models::{Ticket, TicketPriority, TicketStatus, UserRole},
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    routes::params::TicketListQuery,
    state::AppState,
};

/// Tenant admins open tickets against their own restaurant.
pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<Ticket>> {
    authorize(user, Permission::ManageOwnTickets)?;
    let restaurant_id = tenant_of(user)?;

    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }

    let ticket = TicketActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        opened_by: Set(user.user_id),
        title: Set(payload.title),
        description: Set(payload.description),
        category: Set(payload.category.unwrap_or_else(|| "support".into())),
        priority: Set(payload.priority.unwrap_or(TicketPriority::Medium)),
        status: Set(TicketStatus::Open),
        resolved_at: Set(None),
        resolved_by: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Ticket created",
        ticket_from_entity(ticket),
        Some(Meta::empty()),
    ))
}

/// Masters see every tenant's tickets; admins only their own.
pub async fn list_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let mut condition = Condition::all();
    match user.role {
        UserRole::Master => {
            if let Some(restaurant_id) = query.restaurant_id {
                condition = condition.add(TicketCol::RestaurantId.eq(restaurant_id));
            }
        }
        _ => {
            authorize(user, Permission::ManageOwnTickets)?;
            condition = condition.add(TicketCol::RestaurantId.eq(tenant_of(user)?));
        }
    }
    if let Some(status) = query.status {
        condition = condition.add(TicketCol::Status.eq(status));
    }

    let (page, limit, offset) = query.pagination.normalize();
    let finder = Tickets::find()
        .filter(condition)
        .order_by_desc(TicketCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ticket_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", TicketList { items }, Some(meta)))
}

/// Sequential lifecycle, worked by master/support staff. `resolved_at` and
/// `resolved_by` are stamped exactly once, on the transition into resolved,
/// and carried unchanged into closed.
pub async fn transition_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TransitionTicketRequest,
) -> AppResult<ApiResponse<Ticket>> {
    authorize(user, Permission::MasterConsole)?;

    let ticket = Tickets::find_by_id(id).one(&state.orm).await?;
    let ticket = match ticket {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    if !lifecycle::ticket_transition_allowed(ticket.status, payload.status) {
        return Err(AppError::BadRequest(format!(
            "illegal transition {:?} -> {:?}",
            ticket.status, payload.status
        )));
    }

    let from = ticket.status;
    let mut active: TicketActive = ticket.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    if payload.status == TicketStatus::Resolved {
        active.resolved_at = Set(Some(Utc::now().into()));
        active.resolved_by = Set(Some(user.user_id));
    }
    let ticket = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ticket_transition",
        Some("tickets"),
        Some(serde_json::json!({
            "ticket_id": ticket.id,
            "from": from,
            "to": ticket.status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Ticket updated",
        ticket_from_entity(ticket),
        Some(Meta::empty()),
    ))
}

pub(crate) fn ticket_from_entity(model: TicketModel) -> Ticket {
    Ticket {
        id: model.id,
        restaurant_id: model.restaurant_id,
        opened_by: model.opened_by,
        title: model.title,
        description: model.description,
        category: model.category,
        priority: model.priority,
        status: model.status,
        resolved_at: model.resolved_at.map(|dt| dt.with_timezone(&Utc)),
        resolved_by: model.resolved_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
