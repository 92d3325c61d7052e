//! Order and ticket state machines plus the money arithmetic they guard.
//!
//! Everything here is synchronous and database-free; the services layer
//! consults these rules before persisting anything, so transition legality
//! lives in exactly one place.

use crate::models::{OrderStatus, PaymentMethod, TicketStatus};

/// Forward-only order lifecycle. Cancellation is a side exit available
/// while the kitchen can still stop work on the order.
pub fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Preparing)
            | (Preparing, Ready)
            | (Ready, Delivered)
            | (Pending, Cancelled)
            | (Preparing, Cancelled)
    )
}

/// Statuses a kitchen or cashier screen may offer as next actions.
pub fn order_next_statuses(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Preparing, Cancelled],
        Preparing => &[Ready, Cancelled],
        Ready => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

pub fn order_is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
}

/// Support tickets move strictly one step at a time.
pub fn ticket_transition_allowed(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;
    matches!(
        (from, to),
        (Open, InProgress) | (InProgress, Resolved) | (Resolved, Closed)
    )
}

/// Sum of quantity × unit price across cart lines, addons included per unit.
pub fn cart_subtotal(lines: &[CartLine]) -> i64 {
    lines.iter().map(CartLine::line_total).sum()
}

/// Invariant carried over from the order contract: total = subtotal − discount + fee.
pub fn order_total(subtotal: i64, discount: i64, delivery_fee: i64) -> i64 {
    subtotal - discount + delivery_fee
}

/// A priced cart line as captured at order time. Prices are snapshots in
/// minor units; later menu edits never touch them.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub quantity: i64,
    pub unit_price: i64,
    pub addon_prices: Vec<i64>,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        let addons: i64 = self.addon_prices.iter().sum();
        self.quantity * (self.unit_price + addons)
    }
}

/// Change due for a settled payment. Cash must cover the total; other
/// methods settle exactly and carry no tendered amount.
pub fn change_due(method: PaymentMethod, total: i64, tendered: Option<i64>) -> Result<i64, CashError> {
    match method {
        PaymentMethod::Cash => {
            let tendered = tendered.ok_or(CashError::TenderedRequired)?;
            if tendered < total {
                return Err(CashError::InsufficientTendered { total, tendered });
            }
            Ok(tendered - total)
        }
        _ => Ok(0),
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CashError {
    #[error("cash payments require a tendered amount")]
    TenderedRequired,
    #[error("tendered {tendered} does not cover total {total}")]
    InsufficientTendered { total: i64, tendered: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus::*, PaymentMethod, TicketStatus};

    #[test]
    fn happy_path_is_forward_only() {
        assert!(order_transition_allowed(Pending, Preparing));
        assert!(order_transition_allowed(Preparing, Ready));
        assert!(order_transition_allowed(Ready, Delivered));
    }

    #[test]
    fn no_backward_edges() {
        assert!(!order_transition_allowed(Ready, Preparing));
        assert!(!order_transition_allowed(Preparing, Pending));
        assert!(!order_transition_allowed(Delivered, Ready));
        assert!(!order_transition_allowed(Pending, Ready));
        assert!(!order_transition_allowed(Pending, Delivered));
    }

    #[test]
    fn cancel_only_before_ready() {
        assert!(order_transition_allowed(Pending, Cancelled));
        assert!(order_transition_allowed(Preparing, Cancelled));
        assert!(!order_transition_allowed(Ready, Cancelled));
        assert!(!order_transition_allowed(Delivered, Cancelled));
    }

    #[test]
    fn terminal_states_offer_nothing() {
        assert!(order_next_statuses(Delivered).is_empty());
        assert!(order_next_statuses(Cancelled).is_empty());
        assert_eq!(order_next_statuses(Ready), &[Delivered]);
        assert!(order_is_terminal(Delivered));
        assert!(!order_is_terminal(Ready));
    }

    #[test]
    fn self_transitions_are_rejected() {
        // A second "accept" click must not re-apply side effects.
        assert!(!order_transition_allowed(Preparing, Preparing));
        assert!(!order_transition_allowed(Pending, Pending));
    }

    #[test]
    fn ticket_lifecycle_is_strictly_sequential() {
        use TicketStatus::*;
        assert!(ticket_transition_allowed(Open, InProgress));
        assert!(ticket_transition_allowed(InProgress, Resolved));
        assert!(ticket_transition_allowed(Resolved, Closed));
        assert!(!ticket_transition_allowed(Open, Resolved));
        assert!(!ticket_transition_allowed(Open, Closed));
        assert!(!ticket_transition_allowed(InProgress, Closed));
        assert!(!ticket_transition_allowed(Resolved, InProgress));
        assert!(!ticket_transition_allowed(Closed, Open));
    }

    #[test]
    fn subtotal_sums_quantity_times_price() {
        let lines = vec![
            CartLine { quantity: 2, unit_price: 1800, addon_prices: vec![] },
            CartLine { quantity: 1, unit_price: 550, addon_prices: vec![200] },
        ];
        assert_eq!(cart_subtotal(&lines), 3600 + 750);
    }

    #[test]
    fn total_equals_subtotal_without_discount_or_fee() {
        let lines = vec![CartLine { quantity: 2, unit_price: 1800, addon_prices: vec![] }];
        let subtotal = cart_subtotal(&lines);
        assert_eq!(subtotal, 3600);
        assert_eq!(order_total(subtotal, 0, 0), subtotal);
    }

    #[test]
    fn total_applies_discount_and_delivery_fee() {
        assert_eq!(order_total(3600, 300, 500), 3800);
    }

    #[test]
    fn cash_change_is_tendered_minus_total() {
        // T = 25.90, A = 30.00 ⇒ change 4.10
        assert_eq!(change_due(PaymentMethod::Cash, 2590, Some(3000)), Ok(410));
        assert_eq!(change_due(PaymentMethod::Cash, 2590, Some(2590)), Ok(0));
    }

    #[test]
    fn cash_under_total_is_rejected() {
        assert_eq!(
            change_due(PaymentMethod::Cash, 2590, Some(2000)),
            Err(CashError::InsufficientTendered { total: 2590, tendered: 2000 })
        );
        assert_eq!(
            change_due(PaymentMethod::Cash, 2590, None),
            Err(CashError::TenderedRequired)
        );
    }

    #[test]
    fn card_payments_never_owe_change() {
        assert_eq!(change_due(PaymentMethod::CreditCard, 2590, None), Ok(0));
        assert_eq!(change_due(PaymentMethod::Pix, 2590, Some(9999)), Ok(0));
    }
}
