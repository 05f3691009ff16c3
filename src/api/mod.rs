// ============================================================================
// Order API - remote collaborator
// ============================================================================
//
// The order API owns persisted orders. This crate only reads order lists
// and asks for status changes; it never retries a failed request.
//
// ============================================================================

mod client;

use async_trait::async_trait;

use crate::domain::order::OrderStatus;

pub use client::{decode_orders, OrderApiClient};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Order API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Persists a status change remotely
#[async_trait]
pub trait OrderStatusUpdater: Send + Sync {
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<(), ApiError>;
}
