pub mod auth;
pub mod campaigns;
pub mod clients;
pub mod menu;
pub mod orders;
pub mod products;
pub mod restaurants;
pub mod tables;
pub mod tickets;
