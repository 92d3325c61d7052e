use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, KitchenQueue, OrderDetail, OrderItemDetail, OrderLineRequest,
        OrderList, TransitionOrderRequest,
    },
    entity::{
        clients::{ActiveModel as ClientActive, Entity as Clients},
        dining_tables::{ActiveModel as TableActive, Entity as DiningTables},
        order_item_addons::{
            ActiveModel as ItemAddonActive, Column as ItemAddonCol, Entity as OrderItemAddons,
            Model as ItemAddonModel,
        },
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments, Model as PaymentModel},
        product_addons::{Column as AddonCol, Entity as ProductAddons},
        products::{Column as ProdCol, Entity as Products},
        restaurants::Entity as Restaurants,
    },
    error::{AppError, AppResult},
    lifecycle::{self, CartLine},
    middleware::auth::AuthUser,
    models::{
        Order, OrderItem, OrderItemAddon, OrderStatus, OrderType, Payment, PaymentMethod,
        PaymentStatus, RestaurantStatus, TableStatus,
    },
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// One cart line with its price snapshots resolved.
struct PricedLine {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: i64,
    addons: Vec<(Uuid, String, i64)>,
    notes: Option<String>,
}

/// Everything needed to persist an order graph in one transaction.
pub struct CaptureParams {
    pub restaurant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub order_type: OrderType,
    pub initial_status: OrderStatus,
    pub lines: Vec<CaptureLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tendered: Option<i64>,
    pub discount: i64,
    pub delivery_fee: i64,
    pub coupon_code: Option<String>,
    pub points_redeemed: i32,
}

pub struct CaptureLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub addon_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

impl From<OrderLineRequest> for CaptureLine {
    fn from(line: OrderLineRequest) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            addon_ids: line.addon_ids.unwrap_or_default(),
            notes: line.notes,
        }
    }
}

/// POS capture. Order, items, payment and table occupation commit in one
/// transaction; a partial failure leaves nothing behind.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    authorize(user, Permission::CaptureOrders)?;
    let restaurant_id = tenant_of(user)?;

    // A table always means dine-in; otherwise the caller picks.
    let order_type = if payload.table_id.is_some() {
        OrderType::DineIn
    } else {
        payload.order_type.unwrap_or(OrderType::Takeout)
    };

    let params = CaptureParams {
        restaurant_id,
        table_id: payload.table_id,
        client_id: payload.client_id,
        customer_name: payload.customer_name,
        order_type,
        // The POS prints the kitchen slip at capture, so the order enters
        // the lifecycle already in preparing.
        initial_status: OrderStatus::Preparing,
        lines: payload.items.into_iter().map(Into::into).collect(),
        payment_method: payload.payment_method,
        payment_status: PaymentStatus::Completed,
        tendered: payload.tendered,
        discount: payload.discount.unwrap_or(0),
        delivery_fee: payload.delivery_fee.unwrap_or(0),
        coupon_code: payload.coupon_code,
        points_redeemed: payload.points_redeemed.unwrap_or(0),
    };

    let detail = capture_order(state, params).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_captured",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": detail.order.id,
            "total": detail.order.total,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order captured",
        detail,
        Some(Meta::empty()),
    ))
}

/// Shared capture path for the POS and the public checkout.
pub async fn capture_order(state: &AppState, params: CaptureParams) -> AppResult<OrderDetail> {
    if params.lines.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    for line in &params.lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Item quantity must be positive".into()));
        }
    }
    if params.discount < 0 || params.delivery_fee < 0 {
        return Err(AppError::BadRequest("Discount and fee must not be negative".into()));
    }
    if params.points_redeemed < 0 {
        return Err(AppError::BadRequest("Redeemed points must not be negative".into()));
    }
    if params.points_redeemed > 0 && params.client_id.is_none() {
        return Err(AppError::BadRequest("Redeeming points requires a client".into()));
    }

    let txn = state.orm.begin().await?;

    ensure_tenant_active(&txn, params.restaurant_id).await?;

    let priced = price_lines(&txn, params.restaurant_id, &params.lines).await?;

    let cart: Vec<CartLine> = priced
        .iter()
        .map(|line| CartLine {
            quantity: line.quantity as i64,
            unit_price: line.unit_price,
            addon_prices: line.addons.iter().map(|(_, _, price)| *price).collect(),
        })
        .collect();
    let subtotal = lifecycle::cart_subtotal(&cart);
    let total = lifecycle::order_total(subtotal, params.discount, params.delivery_fee);
    if total < 0 {
        return Err(AppError::BadRequest("Discount exceeds order total".into()));
    }

    let (tendered, change) = settle_amounts(&params, total)?;

    // Loyalty: one point per whole currency unit, only for known clients.
    let points_earned = if params.client_id.is_some() {
        (total / 100) as i32
    } else {
        0
    };

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let printed_at = if params.initial_status == OrderStatus::Preparing {
        Some(now.into())
    } else {
        None
    };

    let order = OrderActive {
        id: Set(order_id),
        restaurant_id: Set(params.restaurant_id),
        table_id: Set(params.table_id),
        client_id: Set(params.client_id),
        customer_name: Set(params.customer_name.clone()),
        order_type: Set(params.order_type),
        status: Set(params.initial_status),
        subtotal: Set(subtotal),
        discount: Set(params.discount),
        delivery_fee: Set(params.delivery_fee),
        total: Set(total),
        coupon_code: Set(params.coupon_code.clone()),
        points_earned: Set(points_earned),
        points_redeemed: Set(params.points_redeemed),
        version: Set(0),
        printed_at: Set(printed_at),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItemDetail> = Vec::with_capacity(priced.len());
    for line in &priced {
        let addon_sum: i64 = line.addons.iter().map(|(_, _, price)| *price).sum();
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(line.quantity as i64 * (line.unit_price + addon_sum)),
            notes: Set(line.notes.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let mut addons = Vec::with_capacity(line.addons.len());
        for (addon_id, name, price) in &line.addons {
            let addon = ItemAddonActive {
                id: Set(Uuid::new_v4()),
                order_item_id: Set(item.id),
                addon_id: Set(*addon_id),
                name: Set(name.clone()),
                price: Set(*price),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            addons.push(item_addon_from_entity(addon));
        }

        items.push(OrderItemDetail {
            item: order_item_from_entity(item),
            addons,
        });
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        method: Set(params.payment_method),
        status: Set(params.payment_status),
        amount: Set(total),
        tendered: Set(tendered),
        change: Set(change),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if let Some(table_id) = params.table_id {
        occupy_table(&txn, params.restaurant_id, table_id).await?;
    }

    if params.client_id.is_some() && (points_earned > 0 || params.points_redeemed > 0) {
        adjust_loyalty_points(&txn, &params, points_earned).await?;
    }

    txn.commit().await?;

    Ok(OrderDetail {
        order: order_from_entity(order),
        items,
        payment: Some(payment_from_entity(payment)),
    })
}

/// Status transition with compare-and-swap on the order version. A stale
/// version means another operator already moved the order; the caller gets
/// a 409 and should refresh.
pub async fn transition_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TransitionOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    authorize(user, Permission::TransitionOrders)?;
    let restaurant_id = tenant_of(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::RestaurantId.eq(restaurant_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.version != payload.version {
        return Err(AppError::Conflict(format!(
            "order changed (version {} now {}), refresh",
            payload.version, order.version
        )));
    }

    if !lifecycle::order_transition_allowed(order.status, payload.status) {
        return Err(AppError::BadRequest(format!(
            "illegal transition {:?} -> {:?}",
            order.status, payload.status
        )));
    }

    let table_id = order.table_id;
    let previous_printed_at = order.printed_at;
    let from = order.status;

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    active.version = Set(payload.version + 1);
    active.updated_at = Set(Utc::now().into());
    if payload.status == OrderStatus::Preparing && previous_printed_at.is_none() {
        // Stamped once, when the kitchen slip first prints.
        active.printed_at = Set(Some(Utc::now().into()));
    }
    let order = active.update(&txn).await?;

    match payload.status {
        OrderStatus::Delivered => {
            // The cashier flow ties delivery to payment completion.
            settle_pending_payment(&txn, order.id, PaymentStatus::Completed).await?;
            if let Some(table_id) = table_id {
                release_table(&txn, table_id).await?;
            }
        }
        OrderStatus::Cancelled => {
            void_payment(&txn, order.id).await?;
            if let Some(table_id) = table_id {
                release_table(&txn, table_id).await?;
            }
        }
        _ => {}
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_transition",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "from": from,
            "to": order.status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::RestaurantId.eq(restaurant_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Kitchen display snapshot: the three working queues, oldest first.
pub async fn kitchen_queue(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<KitchenQueue>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;

    let orders = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::RestaurantId.eq(restaurant_id))
                .add(OrderCol::Status.is_in([
                    OrderStatus::Pending,
                    OrderStatus::Preparing,
                    OrderStatus::Ready,
                ])),
        )
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut queue = KitchenQueue {
        pending: Vec::new(),
        preparing: Vec::new(),
        ready: Vec::new(),
    };
    for order in orders {
        let status = order.status;
        let detail = load_detail(&state.orm, order).await?;
        match status {
            OrderStatus::Pending => queue.pending.push(detail),
            OrderStatus::Preparing => queue.preparing.push(detail),
            _ => queue.ready.push(detail),
        }
    }

    Ok(ApiResponse::success("Kitchen queue", queue, Some(Meta::empty())))
}

async fn ensure_tenant_active<C: ConnectionTrait>(conn: &C, restaurant_id: Uuid) -> AppResult<()> {
    let restaurant = Restaurants::find_by_id(restaurant_id).one(conn).await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if restaurant.status != RestaurantStatus::Active {
        return Err(AppError::BadRequest("Restaurant is not active".into()));
    }
    Ok(())
}

/// Resolve price snapshots for every line, row-locked so a concurrent menu
/// edit cannot slip between pricing and insertion.
async fn price_lines<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    lines: &[CaptureLine],
) -> AppResult<Vec<PricedLine>> {
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = Products::find()
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(line.product_id))
                    .add(ProdCol::RestaurantId.eq(restaurant_id)),
            )
            .lock(LockType::Update)
            .one(conn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Unknown product {}",
                    line.product_id
                )));
            }
        };
        if !product.available {
            return Err(AppError::BadRequest(format!(
                "Product {} is not available",
                product.name
            )));
        }

        let mut addons = Vec::with_capacity(line.addon_ids.len());
        for addon_id in &line.addon_ids {
            let addon = ProductAddons::find()
                .filter(
                    Condition::all()
                        .add(AddonCol::Id.eq(*addon_id))
                        .add(AddonCol::ProductId.eq(product.id)),
                )
                .one(conn)
                .await?;
            let addon = match addon {
                Some(a) => a,
                None => {
                    return Err(AppError::BadRequest(format!("Unknown addon {addon_id}")));
                }
            };
            addons.push((addon.id, addon.name, addon.price));
        }

        priced.push(PricedLine {
            product_id: product.id,
            product_name: product.name,
            quantity: line.quantity,
            unit_price: product.price,
            addons,
            notes: line.notes.clone(),
        });
    }
    Ok(priced)
}

fn settle_amounts(params: &CaptureParams, total: i64) -> AppResult<(Option<i64>, Option<i64>)> {
    if params.payment_status != PaymentStatus::Completed {
        // Deferred settlement (public checkout); nothing tendered yet.
        return Ok((None, None));
    }
    let change = lifecycle::change_due(params.payment_method, total, params.tendered)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    match params.payment_method {
        PaymentMethod::Cash => Ok((params.tendered, Some(change))),
        _ => Ok((None, None)),
    }
}

async fn occupy_table<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    table_id: Uuid,
) -> AppResult<()> {
    let table = DiningTables::find_by_id(table_id).one(conn).await?;
    let table = match table {
        Some(t) if t.restaurant_id == restaurant_id => t,
        _ => return Err(AppError::BadRequest("Unknown table".into())),
    };
    let mut active: TableActive = table.into();
    active.status = Set(TableStatus::Occupied);
    active.update(conn).await?;
    Ok(())
}

async fn release_table<C: ConnectionTrait>(conn: &C, table_id: Uuid) -> AppResult<()> {
    let table = DiningTables::find_by_id(table_id).one(conn).await?;
    if let Some(table) = table {
        let mut active: TableActive = table.into();
        active.status = Set(TableStatus::Available);
        active.update(conn).await?;
    }
    Ok(())
}

async fn adjust_loyalty_points<C: ConnectionTrait>(
    conn: &C,
    params: &CaptureParams,
    points_earned: i32,
) -> AppResult<()> {
    let client_id = match params.client_id {
        Some(id) => id,
        None => return Ok(()),
    };
    let client = Clients::find_by_id(client_id).one(conn).await?;
    let client = match client {
        Some(c) if c.restaurant_id == params.restaurant_id => c,
        _ => return Err(AppError::BadRequest("Unknown client".into())),
    };
    if params.points_redeemed > client.loyalty_points {
        return Err(AppError::BadRequest("Not enough loyalty points".into()));
    }
    let balance = client.loyalty_points - params.points_redeemed + points_earned;
    let mut active: ClientActive = client.into();
    active.loyalty_points = Set(balance);
    active.update(conn).await?;
    Ok(())
}

async fn settle_pending_payment<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    to: PaymentStatus,
) -> AppResult<()> {
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(conn)
        .await?;
    if let Some(payment) = payment {
        if payment.status == PaymentStatus::Pending {
            let mut active: PaymentActive = payment.into();
            active.status = Set(to);
            active.updated_at = Set(Utc::now().into());
            active.update(conn).await?;
        }
    }
    Ok(())
}

/// Cancellation: an unsettled payment fails, a settled one is refunded so
/// the money trail matches the order's terminal state.
async fn void_payment<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<()> {
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(conn)
        .await?;
    if let Some(payment) = payment {
        let to = match payment.status {
            PaymentStatus::Pending => Some(PaymentStatus::Failed),
            PaymentStatus::Completed => Some(PaymentStatus::Refunded),
            _ => None,
        };
        if let Some(to) = to {
            let mut active: PaymentActive = payment.into();
            active.status = Set(to);
            active.updated_at = Set(Utc::now().into());
            active.update(conn).await?;
        }
    }
    Ok(())
}

async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?;

    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let mut addons = if item_ids.is_empty() {
        Vec::new()
    } else {
        OrderItemAddons::find()
            .filter(ItemAddonCol::OrderItemId.is_in(item_ids))
            .all(conn)
            .await?
    };

    let mut details = Vec::with_capacity(items.len());
    for item in items {
        let (mine, rest): (Vec<ItemAddonModel>, Vec<ItemAddonModel>) =
            addons.into_iter().partition(|a| a.order_item_id == item.id);
        addons = rest;
        details.push(OrderItemDetail {
            item: order_item_from_entity(item),
            addons: mine.into_iter().map(item_addon_from_entity).collect(),
        });
    }

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(conn)
        .await?
        .map(payment_from_entity);

    Ok(OrderDetail {
        order: order_from_entity(order),
        items: details,
        payment,
    })
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        restaurant_id: model.restaurant_id,
        table_id: model.table_id,
        client_id: model.client_id,
        customer_name: model.customer_name,
        order_type: model.order_type,
        status: model.status,
        subtotal: model.subtotal,
        discount: model.discount,
        delivery_fee: model.delivery_fee,
        total: model.total,
        coupon_code: model.coupon_code,
        points_earned: model.points_earned,
        points_redeemed: model.points_redeemed,
        version: model.version,
        printed_at: model.printed_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn item_addon_from_entity(model: ItemAddonModel) -> OrderItemAddon {
    OrderItemAddon {
        id: model.id,
        order_item_id: model.order_item_id,
        addon_id: model.addon_id,
        name: model.name,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        method: model.method,
        status: model.status,
        amount: model.amount,
        tendered: model.tendered,
        change: model.change,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
