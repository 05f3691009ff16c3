use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderStatus, Role};

// ============================================================================
// Order Events
// ============================================================================

/// Emitted once the order API has accepted a status change
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub order_id: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: Role,
    pub changed_at: DateTime<Utc>,
}

impl OrderStatusChanged {
    pub fn event_type() -> &'static str {
        "OrderStatusChanged"
    }
}
