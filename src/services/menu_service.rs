use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::{
        menu::{DigitalMenu, MenuRestaurant, PublicCheckoutRequest},
        orders::OrderDetail,
        products::ProductWithAddons,
    },
    entity::{
        product_addons::{Column as AddonCol, Entity as ProductAddons},
        products::{Column as ProdCol, Entity as Products},
        restaurants::{Column as RestaurantCol, Entity as Restaurants, Model as RestaurantModel},
    },
    error::{AppError, AppResult},
    models::{OrderStatus, OrderType, PaymentStatus, RestaurantStatus},
    response::{ApiResponse, Meta},
    services::{
        client_service,
        order_service::{self, CaptureLine, CaptureParams},
        product_service,
    },
    state::AppState,
};

/// Read-only digital menu on the public slug route. Only available items of
/// an active tenant are exposed.
pub async fn digital_menu(state: &AppState, slug: &str) -> AppResult<ApiResponse<DigitalMenu>> {
    let restaurant = find_active_by_slug(state, slug).await?;

    let products = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::RestaurantId.eq(restaurant.id))
                .add(ProdCol::Available.eq(true)),
        )
        .order_by_asc(ProdCol::Category)
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?;

    let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();
    let mut addons = if product_ids.is_empty() {
        Vec::new()
    } else {
        ProductAddons::find()
            .filter(AddonCol::ProductId.is_in(product_ids))
            .order_by_asc(AddonCol::Name)
            .all(&state.orm)
            .await?
    };

    let mut entries = Vec::with_capacity(products.len());
    for product in products {
        let (mine, rest): (Vec<_>, Vec<_>) =
            addons.into_iter().partition(|a| a.product_id == product.id);
        addons = rest;
        entries.push(ProductWithAddons {
            product: product_service::product_from_entity(product),
            addons: mine
                .into_iter()
                .map(product_service::addon_from_entity)
                .collect(),
        });
    }

    let menu = DigitalMenu {
        restaurant: MenuRestaurant {
            id: restaurant.id,
            name: restaurant.name,
            slug: restaurant.slug,
            phone: restaurant.phone,
            address: restaurant.address,
        },
        products: entries,
    };

    Ok(ApiResponse::success("Menu", menu, Some(Meta::empty())))
}

/// Customer checkout. The customer record is upserted by phone, then the
/// cart goes through the same transactional capture path as the POS; the
/// order starts pending with a pending payment settled on delivery.
pub async fn checkout(
    state: &AppState,
    slug: &str,
    payload: PublicCheckoutRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let restaurant = find_active_by_slug(state, slug).await?;

    if payload.order_type == OrderType::DineIn {
        return Err(AppError::BadRequest(
            "Online checkout supports takeout and delivery only".into(),
        ));
    }
    if payload.order_type == OrderType::Delivery && payload.customer.address.is_none() {
        return Err(AppError::BadRequest("Delivery requires an address".into()));
    }

    let client = client_service::upsert_by_phone(
        state,
        restaurant.id,
        &payload.customer.name,
        &payload.customer.phone,
        payload.customer.email.clone(),
        payload.customer.address.clone(),
    )
    .await?;

    let params = CaptureParams {
        restaurant_id: restaurant.id,
        table_id: None,
        client_id: Some(client.id),
        customer_name: Some(payload.customer.name.clone()),
        order_type: payload.order_type,
        initial_status: OrderStatus::Pending,
        lines: payload
            .items
            .into_iter()
            .map(|l| CaptureLine {
                product_id: l.product_id,
                quantity: l.quantity,
                addon_ids: l.addon_ids.unwrap_or_default(),
                notes: l.notes,
            })
            .collect(),
        payment_method: payload.payment_method,
        payment_status: PaymentStatus::Pending,
        tendered: None,
        discount: 0,
        delivery_fee: if payload.order_type == OrderType::Delivery {
            payload.delivery_fee.unwrap_or(0)
        } else {
            0
        },
        coupon_code: None,
        points_redeemed: 0,
    };

    let detail = order_service::capture_order(state, params).await?;

    Ok(ApiResponse::success(
        "Order placed",
        detail,
        Some(Meta::empty()),
    ))
}

async fn find_active_by_slug(state: &AppState, slug: &str) -> AppResult<RestaurantModel> {
    let restaurant = Restaurants::find()
        .filter(RestaurantCol::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if restaurant.status != RestaurantStatus::Active {
        // Suspended tenants disappear from the public surface.
        return Err(AppError::NotFound);
    }
    Ok(restaurant)
}
