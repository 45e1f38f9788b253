//! `buildmart-orders`: the order lifecycle.
//!
//! The [`machine::OrderStateMachine`] is the single entry point for every
//! lifecycle mutation. It enforces the role-then-state check order, resolves
//! transitions against the pure table in [`transitions`], commits the order
//! mutation together with its ledger and satellite writes, and only then
//! hands sync triggers to a [`dispatch::SyncDispatcher`].

pub mod delivery;
pub mod dispatch;
pub mod ledger;
pub mod machine;
pub mod order;
pub mod payment;
pub mod status;
pub mod storage;
pub mod transitions;

pub use delivery::{DeliveryStatus, FleetDetails, OrderDelivery};
pub use dispatch::{NullSyncDispatcher, SyncDispatcher, SyncKind, SyncTrigger};
pub use ledger::{OrderStatusEvent, StatusHistoryLedger};
pub use machine::OrderStateMachine;
pub use order::{
    DeliveryDetails, DocumentKind, ExternalRefs, LineItemPrice, Order, OrderItem, PricingLine,
    PricingSnapshot,
};
pub use payment::{OrderPayment, PaymentMethod};
pub use status::OrderStatus;
pub use storage::{
    DeliveryStore, InMemoryDeliveryStore, InMemoryOrderStore, InMemoryPaymentStore, OrderStore,
    PaymentStore,
};
pub use transitions::{OrderAction, RequiredRole, Resolution, SideEffect, resolve};
