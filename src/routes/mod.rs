use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod campaigns;
pub mod clients;
pub mod doc;
pub mod health;
pub mod kitchen;
pub mod master;
pub mod menu;
pub mod orders;
pub mod params;
pub mod products;
pub mod tables;
pub mod tickets;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/orders", orders::router())
        .nest("/kitchen", kitchen::router())
        .nest("/products", products::router())
        .nest("/tables", tables::router())
        .nest("/clients", clients::router())
        .nest("/campaigns", campaigns::router())
        .nest("/tickets", tickets::router())
        .nest("/master", master::router())
}

/// Unauthenticated customer-facing routes (digital menu + checkout).
pub fn create_public_router() -> Router<AppState> {
    Router::new().nest("/menu", menu::router())
}
