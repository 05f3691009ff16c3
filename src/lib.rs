//! Order list projection and status workflow for a food-ordering client.
//!
//! [`domain::order::project`] groups orders by the local day they were
//! created; [`domain::order::StatusUpdateHandler`] validates and applies
//! restaurant-owner status changes against the remote order API.

pub mod api;
pub mod config;
pub mod domain;
pub mod metrics;

pub use domain::order::{
    project, project_in, project_view, DateGroup, ExpandState, Order, OrderError, OrderStatus,
    OrderTab, Role, StatusFilter, StatusTransitionGuard, StatusUpdateHandler,
};
