use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::products::ProductWithAddons,
    models::{OrderType, PaymentMethod},
};

/// Read-only digital menu served on the public slug route.
#[derive(Debug, Serialize, ToSchema)]
pub struct DigitalMenu {
    pub restaurant: MenuRestaurant,
    pub products: Vec<ProductWithAddons>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuRestaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub addon_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
}

/// Customer checkout: identity, cart and payment method in one request.
/// Delivery orders start pending with a pending payment settled on delivery.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublicCheckoutRequest {
    pub customer: CheckoutCustomer,
    pub order_type: OrderType,
    pub items: Vec<CheckoutLineRequest>,
    pub payment_method: PaymentMethod,
    pub delivery_fee: Option<i64>,
}
