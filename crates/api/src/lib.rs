//! `buildmart-api`: the HTTP surface over the order lifecycle.

pub mod app;
pub mod context;
pub mod middleware;
