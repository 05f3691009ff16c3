use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::{OrderStatus, Role};

// ============================================================================
// Status Transition Guard
// ============================================================================
//
// Restaurant owners move orders through the lifecycle from a selector.
// Rules:
// - only a restaurant owner may request a change
// - `placed` is never a valid target
// - under `ForwardOnly`, the target must come after the current status
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPolicy {
    /// Any status except `placed` may be selected
    #[default]
    Permissive,
    /// Additionally require the target to be later in the lifecycle
    ForwardOnly,
}

/// One entry of the status selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub status: OrderStatus,
    pub label: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTransitionGuard {
    policy: TransitionPolicy,
}

impl StatusTransitionGuard {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn can_transition(&self, current: OrderStatus, requested: OrderStatus, actor: Role) -> bool {
        self.check("", current, requested, actor).is_ok()
    }

    /// Validate a requested change for `order_id`
    pub fn check(
        &self,
        order_id: &str,
        current: OrderStatus,
        requested: OrderStatus,
        actor: Role,
    ) -> Result<(), OrderError> {
        if actor != Role::RestaurantOwner {
            return Err(OrderError::Unauthorized {
                order_id: order_id.to_string(),
                requested,
                actor,
            });
        }

        let allowed = match self.policy {
            TransitionPolicy::Permissive => requested.is_selectable_target(),
            TransitionPolicy::ForwardOnly => requested.is_selectable_target() && requested > current,
        };

        if !allowed {
            return Err(OrderError::InvalidTransition {
                order_id: order_id.to_string(),
                current,
                requested,
            });
        }

        Ok(())
    }

    /// Entries for the status selector of an order currently in `current`
    pub fn status_options(&self, current: OrderStatus) -> Vec<StatusOption> {
        OrderStatus::ALL
            .into_iter()
            .map(|status| StatusOption {
                status,
                label: status.label(),
                disabled: status != current
                    && !self.can_transition(current, status, Role::RestaurantOwner),
            })
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_cannot_change_status() {
        let guard = StatusTransitionGuard::default();
        assert!(!guard.can_transition(OrderStatus::Paid, OrderStatus::InProgress, Role::Customer));

        let err = guard
            .check("o1", OrderStatus::Paid, OrderStatus::InProgress, Role::Customer)
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
        assert_eq!(err.order_id(), Some("o1"));
        assert_eq!(err.requested(), Some(OrderStatus::InProgress));
    }

    #[test]
    fn test_placed_is_never_a_target() {
        let guard = StatusTransitionGuard::default();
        assert!(!guard.can_transition(OrderStatus::InProgress, OrderStatus::Placed, Role::RestaurantOwner));

        let err = guard
            .check("o1", OrderStatus::InProgress, OrderStatus::Placed, Role::RestaurantOwner)
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                current: OrderStatus::InProgress,
                requested: OrderStatus::Placed,
                ..
            }
        ));
    }

    #[test]
    fn test_permissive_allows_backwards_moves() {
        let guard = StatusTransitionGuard::default();
        assert!(guard.can_transition(OrderStatus::Delivered, OrderStatus::Paid, Role::RestaurantOwner));
        assert!(guard.can_transition(OrderStatus::Placed, OrderStatus::Delivered, Role::RestaurantOwner));
        assert!(guard.can_transition(OrderStatus::Paid, OrderStatus::Paid, Role::RestaurantOwner));
    }

    #[test]
    fn test_forward_only_policy() {
        let guard = StatusTransitionGuard::new(TransitionPolicy::ForwardOnly);
        assert!(guard.can_transition(OrderStatus::Paid, OrderStatus::OutForDelivery, Role::RestaurantOwner));
        assert!(!guard.can_transition(OrderStatus::Delivered, OrderStatus::Paid, Role::RestaurantOwner));
        assert!(!guard.can_transition(OrderStatus::Paid, OrderStatus::Paid, Role::RestaurantOwner));
        assert!(!guard.can_transition(OrderStatus::Placed, OrderStatus::Placed, Role::RestaurantOwner));
    }

    #[test]
    fn test_status_options_disable_placed() {
        let options = StatusTransitionGuard::default().status_options(OrderStatus::InProgress);
        assert_eq!(options.len(), 5);

        let disabled: Vec<_> = options.iter().filter(|o| o.disabled).map(|o| o.status).collect();
        assert_eq!(disabled, vec![OrderStatus::Placed]);
        assert_eq!(options[1].label, "Awaiting Restaurant Confirmation");
    }

    #[test]
    fn test_status_options_keep_current_enabled_under_forward_only() {
        let options = StatusTransitionGuard::new(TransitionPolicy::ForwardOnly)
            .status_options(OrderStatus::InProgress);

        let enabled: Vec<_> = options.iter().filter(|o| !o.disabled).map(|o| o.status).collect();
        assert_eq!(
            enabled,
            vec![OrderStatus::InProgress, OrderStatus::OutForDelivery, OrderStatus::Delivered]
        );
    }
}
