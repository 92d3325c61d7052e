use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Ticket, TicketPriority, TicketStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionTicketRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketList {
    pub items: Vec<Ticket>,
}
