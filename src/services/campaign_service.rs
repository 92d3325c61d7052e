use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::campaigns::{CampaignList, CreateCampaignRequest},
    entity::{
        campaigns::{
            ActiveModel as CampaignActive, Column as CampaignCol, Entity as Campaigns,
            Model as CampaignModel,
        },
        clients::{Column as ClientCol, Entity as Clients},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Campaign, CampaignStatus},
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_campaigns(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CampaignList>> {
    authorize(user, Permission::ManageCampaigns)?;
    let restaurant_id = tenant_of(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Campaigns::find()
        .filter(CampaignCol::RestaurantId.eq(restaurant_id))
        .order_by_desc(CampaignCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(campaign_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", CampaignList { items }, Some(meta)))
}

pub async fn create_campaign(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCampaignRequest,
) -> AppResult<ApiResponse<Campaign>> {
    authorize(user, Permission::ManageCampaigns)?;
    let restaurant_id = tenant_of(user)?;

    if payload.name.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Name and message are required".into()));
    }

    let campaign = CampaignActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(payload.name),
        message: Set(payload.message),
        status: Set(CampaignStatus::Draft),
        audience_size: Set(None),
        sent_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Campaign created",
        campaign_from_entity(campaign),
        Some(Meta::empty()),
    ))
}

/// Marks a draft as sent and snapshots the audience size from the client
/// roster. Actual message delivery happens outside this service.
pub async fn send_campaign(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Campaign>> {
    authorize(user, Permission::ManageCampaigns)?;
    let restaurant_id = tenant_of(user)?;

    let campaign = Campaigns::find()
        .filter(
            Condition::all()
                .add(CampaignCol::Id.eq(id))
                .add(CampaignCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    let campaign = match campaign {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    if campaign.status == CampaignStatus::Sent {
        return Err(AppError::BadRequest("Campaign was already sent".into()));
    }

    let audience = Clients::find()
        .filter(ClientCol::RestaurantId.eq(restaurant_id))
        .count(&state.orm)
        .await? as i32;

    let mut active: CampaignActive = campaign.into();
    active.status = Set(CampaignStatus::Sent);
    active.audience_size = Set(Some(audience));
    active.sent_at = Set(Some(Utc::now().into()));
    let campaign = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Campaign sent",
        campaign_from_entity(campaign),
        Some(Meta::empty()),
    ))
}

pub async fn delete_campaign(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Campaign>> {
    authorize(user, Permission::ManageCampaigns)?;
    let restaurant_id = tenant_of(user)?;

    let campaign = Campaigns::find()
        .filter(
            Condition::all()
                .add(CampaignCol::Id.eq(id))
                .add(CampaignCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    let campaign = match campaign {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    if campaign.status == CampaignStatus::Sent {
        return Err(AppError::BadRequest("Sent campaigns cannot be deleted".into()));
    }

    let snapshot = campaign_from_entity(campaign.clone());
    campaign.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Campaign deleted",
        snapshot,
        Some(Meta::empty()),
    ))
}

pub(crate) fn campaign_from_entity(model: CampaignModel) -> Campaign {
    Campaign {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        message: model.message,
        status: model.status,
        audience_size: model.audience_size,
        sent_at: model.sent_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
