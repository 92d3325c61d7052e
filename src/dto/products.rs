use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, ProductAddon};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: i64,
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAddonRequest {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithAddons {
    pub product: Product,
    pub addons: Vec<ProductAddon>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
