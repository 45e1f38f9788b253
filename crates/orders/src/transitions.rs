//! The order transition table.
//!
//! Every status change funnels through [`resolve`], which is a pure function
//! of (current status, action). Persistence, ledger writes, and sync dispatch
//! happen in [`crate::machine`] only after a transition resolves.

use buildmart_core::{DomainError, DomainResult};

use crate::status::OrderStatus;

/// A lifecycle action, carrying nothing but intent. Role enforcement happens
/// before state enforcement so a forbidden caller learns nothing about the
/// order's current position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderAction {
    /// Customer checks out the cart.
    Place,
    /// Vendor commits to fulfilling the order.
    VendorAccept,
    /// Vendor declines; the order terminates cancelled.
    VendorReject,
    /// Admin records that payment cleared.
    MarkPaymentDone,
    /// Admin confirms with final line-item pricing.
    AdminConfirm,
    /// Vendor advances the shipping phase to the given status.
    UpdateShipping(OrderStatus),
    /// Admin cancels from any non-terminal state.
    AdminCancel,
}

/// Which role is allowed to perform an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequiredRole {
    Customer,
    Vendor,
    Admin,
}

/// Work that must run after the transition commits. Dispatch is
/// fire-and-forget; a sync failure never rolls the transition back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Mirror the order as a quote and sales order in accounting.
    QuoteAndSalesOrderSync,
    /// Mirror the order as an invoice and e-way bill in accounting.
    InvoiceAndEwayBillSync,
    /// Stamp delivery records with the completion time.
    FinalizeDelivery,
}

/// Outcome of resolving an action against the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Apply {
        next: OrderStatus,
        effects: Vec<SideEffect>,
    },
    /// The order is already in the requested state; callers treat this as a
    /// successful no-op and persist nothing.
    AlreadyApplied,
}

impl OrderAction {
    pub fn required_role(&self) -> RequiredRole {
        match self {
            OrderAction::Place => RequiredRole::Customer,
            OrderAction::VendorAccept | OrderAction::VendorReject => RequiredRole::Vendor,
            OrderAction::UpdateShipping(_) => RequiredRole::Vendor,
            OrderAction::MarkPaymentDone | OrderAction::AdminConfirm | OrderAction::AdminCancel => {
                RequiredRole::Admin
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Place => "place",
            OrderAction::VendorAccept => "vendor_accept",
            OrderAction::VendorReject => "vendor_reject",
            OrderAction::MarkPaymentDone => "mark_payment_done",
            OrderAction::AdminConfirm => "admin_confirm",
            OrderAction::UpdateShipping(_) => "update_shipping",
            OrderAction::AdminCancel => "admin_cancel",
        }
    }
}

/// Resolve an action against the current status.
///
/// Repeating the status the order already holds is an idempotent no-op for
/// non-terminal states and a conflict for terminal ones. Shipping updates
/// move forward only; skipping intermediate shipping statuses is allowed.
pub fn resolve(current: OrderStatus, action: OrderAction) -> DomainResult<Resolution> {
    if current.is_terminal() {
        return Err(DomainError::state_conflict(
            current.as_str(),
            format!("order is {current} and accepts no further transitions"),
        ));
    }

    let apply = |next: OrderStatus, effects: Vec<SideEffect>| Ok(Resolution::Apply { next, effects });

    match action {
        OrderAction::Place => match current {
            OrderStatus::Pending => apply(OrderStatus::OrderPlaced, Vec::new()),
            OrderStatus::OrderPlaced => Ok(Resolution::AlreadyApplied),
            _ => Err(transition_conflict(current, OrderStatus::OrderPlaced, OrderStatus::Pending)),
        },
        OrderAction::VendorAccept => match current {
            OrderStatus::OrderPlaced => {
                apply(OrderStatus::VendorAccepted, vec![SideEffect::QuoteAndSalesOrderSync])
            }
            OrderStatus::VendorAccepted => Ok(Resolution::AlreadyApplied),
            _ => Err(transition_conflict(
                current,
                OrderStatus::VendorAccepted,
                OrderStatus::OrderPlaced,
            )),
        },
        OrderAction::VendorReject => match current {
            OrderStatus::OrderPlaced => apply(OrderStatus::Cancelled, Vec::new()),
            _ => Err(DomainError::state_conflict(
                current.as_str(),
                "vendor may only reject a freshly placed order",
            )),
        },
        OrderAction::MarkPaymentDone => match current {
            OrderStatus::VendorAccepted => apply(OrderStatus::PaymentDone, Vec::new()),
            OrderStatus::PaymentDone => Ok(Resolution::AlreadyApplied),
            _ => Err(transition_conflict(
                current,
                OrderStatus::PaymentDone,
                OrderStatus::VendorAccepted,
            )),
        },
        OrderAction::AdminConfirm => match current {
            OrderStatus::PaymentDone => apply(OrderStatus::OrderConfirmed, Vec::new()),
            OrderStatus::OrderConfirmed => Ok(Resolution::AlreadyApplied),
            _ => Err(transition_conflict(
                current,
                OrderStatus::OrderConfirmed,
                OrderStatus::PaymentDone,
            )),
        },
        OrderAction::UpdateShipping(target) => resolve_shipping(current, target),
        OrderAction::AdminCancel => apply(OrderStatus::Cancelled, Vec::new()),
    }
}

fn resolve_shipping(current: OrderStatus, target: OrderStatus) -> DomainResult<Resolution> {
    if !target.is_shipping_target() {
        return Err(DomainError::validation(format!(
            "'{target}' is not a shipping status"
        )));
    }
    let current_rank = current.shipping_rank().ok_or_else(|| {
        DomainError::state_conflict(
            current.as_str(),
            "shipping updates require a confirmed order",
        )
    })?;
    // is_shipping_target guarantees a rank for the target.
    let target_rank = target.shipping_rank().unwrap_or(u8::MAX);

    if target == current {
        return Ok(Resolution::AlreadyApplied);
    }
    if target_rank < current_rank {
        return Err(DomainError::state_conflict(
            current.as_str(),
            format!("shipping status cannot move backwards to '{target}'"),
        ));
    }

    let mut effects = Vec::new();
    // Effects fire when the order crosses the milestone, including when an
    // update skips past it.
    let out_rank = OrderStatus::OutForDelivery.shipping_rank().unwrap_or(u8::MAX);
    if current_rank < out_rank && target_rank >= out_rank {
        effects.push(SideEffect::InvoiceAndEwayBillSync);
    }
    if target == OrderStatus::Delivered {
        effects.push(SideEffect::FinalizeDelivery);
    }
    Ok(Resolution::Apply { next: target, effects })
}

fn transition_conflict(
    current: OrderStatus,
    wanted: OrderStatus,
    required: OrderStatus,
) -> DomainError {
    DomainError::state_conflict(
        current.as_str(),
        format!("cannot move from '{current}' to '{wanted}'; order must be '{required}' first"),
    )
}
