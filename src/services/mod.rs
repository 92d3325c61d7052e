pub mod auth_service;
pub mod campaign_service;
pub mod client_service;
pub mod menu_service;
pub mod order_service;
pub mod product_service;
pub mod restaurant_service;
pub mod table_service;
pub mod ticket_service;
