use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DiningTable, TableStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub number: i32,
    pub seats: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTableStatusRequest {
    pub status: TableStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableList {
    pub items: Vec<DiningTable>,
}
