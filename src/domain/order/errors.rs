use super::value_objects::{OrderStatus, Role};
use super::record::Order;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order {order_id}: {actor} may not change status to {requested}")]
    Unauthorized {
        order_id: String,
        requested: OrderStatus,
        actor: Role,
    },

    #[error("Order {order_id}: cannot move from {current} to {requested}")]
    InvalidTransition {
        order_id: String,
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Order {order_id}: status update to {requested} is already in flight")]
    TransitionPending {
        order_id: String,
        requested: OrderStatus,
    },

    #[error("Order {order_id}: remote update to {requested} failed: {reason}")]
    RemoteUpdateFailed {
        order_id: String,
        requested: OrderStatus,
        previous: OrderStatus,
        reason: String,
    },

    #[error("Order {order_id} is malformed: {reason}")]
    MalformedRecord { order_id: String, reason: String },

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

impl OrderError {
    /// Order the error concerns, if any
    pub fn order_id(&self) -> Option<&str> {
        match self {
            OrderError::Unauthorized { order_id, .. }
            | OrderError::InvalidTransition { order_id, .. }
            | OrderError::TransitionPending { order_id, .. }
            | OrderError::RemoteUpdateFailed { order_id, .. }
            | OrderError::MalformedRecord { order_id, .. } => Some(order_id),
            OrderError::UnknownStatus(_) => None,
        }
    }

    /// Status the caller asked for, if any
    pub fn requested(&self) -> Option<OrderStatus> {
        match self {
            OrderError::Unauthorized { requested, .. }
            | OrderError::InvalidTransition { requested, .. }
            | OrderError::TransitionPending { requested, .. }
            | OrderError::RemoteUpdateFailed { requested, .. } => Some(*requested),
            OrderError::MalformedRecord { .. } | OrderError::UnknownStatus(_) => None,
        }
    }

    /// Undo an optimistic status change after a failed remote update.
    ///
    /// Returns true when `order` was rolled back.
    pub fn revert_status(&self, order: &mut Order) -> bool {
        match self {
            OrderError::RemoteUpdateFailed {
                order_id,
                requested,
                previous,
                ..
            } if *order_id == order.id && order.status == *requested => {
                order.status = *previous;
                true
            }
            _ => false,
        }
    }
}
