use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderItemAddon, OrderStatus, OrderType, Payment, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub addon_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
}

/// POS capture: one request, one transaction. Order, items, addons, payment
/// and table occupation land together or not at all.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub table_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub customer_name: Option<String>,
    /// Ignored when a table is selected (a table always means dine_in).
    pub order_type: Option<OrderType>,
    pub items: Vec<OrderLineRequest>,
    pub payment_method: PaymentMethod,
    /// Cash only; minor units.
    pub tendered: Option<i64>,
    pub discount: Option<i64>,
    pub delivery_fee: Option<i64>,
    pub coupon_code: Option<String>,
    pub points_redeemed: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionOrderRequest {
    pub status: OrderStatus,
    /// Version the caller last saw; mismatch means another operator got
    /// there first and the request is rejected with 409.
    pub version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    pub item: OrderItem,
    pub addons: Vec<OrderItemAddon>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Kitchen display snapshot; clients poll this endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct KitchenQueue {
    pub pending: Vec<OrderDetail>,
    pub preparing: Vec<OrderDetail>,
    pub ready: Vec<OrderDetail>,
}
