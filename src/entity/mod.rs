pub mod audit_logs;
pub mod campaigns;
pub mod clients;
pub mod dining_tables;
pub mod order_item_addons;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod product_addons;
pub mod products;
pub mod restaurants;
pub mod tickets;
pub mod user_profiles;

pub use audit_logs::Entity as AuditLogs;
pub use campaigns::Entity as Campaigns;
pub use clients::Entity as Clients;
pub use dining_tables::Entity as DiningTables;
pub use order_item_addons::Entity as OrderItemAddons;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use product_addons::Entity as ProductAddons;
pub use products::Entity as Products;
pub use restaurants::Entity as Restaurants;
pub use tickets::Entity as Tickets;
pub use user_profiles::Entity as UserProfiles;
