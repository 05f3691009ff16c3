use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;

use crate::api::OrderStatusUpdater;
use crate::metrics::Metrics;

use super::errors::OrderError;
use super::events::OrderStatusChanged;
use super::record::Order;
use super::transition::StatusTransitionGuard;
use super::value_objects::{OrderStatus, Role};

// ============================================================================
// Status Update Handler
// ============================================================================
//
// Orchestrates: Guard → optimistic update → remote update → event
//
// At most one update per order is in flight. The remote call is issued
// exactly once; a failure is reported, never retried.
//
// ============================================================================

/// Orders with a status update awaiting the remote API
#[derive(Clone, Default)]
pub struct PendingTransitions {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PendingTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, order_id: &str) -> bool {
        self.lock().contains(order_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Claim `order_id`; `None` when it is already claimed
    fn claim(&self, order_id: &str) -> Option<PendingSlot> {
        if self.lock().insert(order_id.to_string()) {
            Some(PendingSlot {
                pending: self.clone(),
                order_id: order_id.to_string(),
            })
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its order when dropped, including when the update future is
/// dropped mid-flight
struct PendingSlot {
    pending: PendingTransitions,
    order_id: String,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.order_id);
    }
}

pub struct StatusUpdateHandler<U> {
    updater: U,
    guard: StatusTransitionGuard,
    pending: PendingTransitions,
    metrics: Arc<Metrics>,
}

impl<U: OrderStatusUpdater> StatusUpdateHandler<U> {
    pub fn new(updater: U, guard: StatusTransitionGuard, metrics: Arc<Metrics>) -> Self {
        Self {
            updater,
            guard,
            pending: PendingTransitions::new(),
            metrics,
        }
    }

    /// Share an existing in-flight set, e.g. with a second handler for the
    /// same screen
    pub fn with_pending(mut self, pending: PendingTransitions) -> Self {
        self.pending = pending;
        self
    }

    pub fn guard(&self) -> &StatusTransitionGuard {
        &self.guard
    }

    pub fn pending(&self) -> &PendingTransitions {
        &self.pending
    }

    /// True while an update for `order_id` awaits the remote API; the
    /// selector for that order should be disabled
    pub fn is_loading(&self, order_id: &str) -> bool {
        self.pending.is_pending(order_id)
    }

    pub fn can_transition(&self, current: OrderStatus, requested: OrderStatus, actor: Role) -> bool {
        self.guard.can_transition(current, requested, actor)
    }

    /// Validate and apply a status change.
    ///
    /// `order.status` is set to `requested` before the remote call. On
    /// `RemoteUpdateFailed` it is left that way; use
    /// [`OrderError::revert_status`] to roll back.
    pub async fn apply_transition(
        &self,
        order: &mut Order,
        requested: OrderStatus,
        actor: Role,
    ) -> Result<OrderStatusChanged, OrderError> {
        let previous = order.status;

        if let Err(error) = self.guard.check(&order.id, previous, requested, actor) {
            tracing::warn!(
                order_id = %order.id,
                from = %previous,
                to = %requested,
                actor = %actor,
                error = %error,
                "Status transition rejected"
            );
            self.metrics.record_transition(outcome_label(&error));
            return Err(error);
        }

        let Some(_slot) = self.pending.claim(&order.id) else {
            tracing::debug!(order_id = %order.id, "Status update already in flight");
            let error = OrderError::TransitionPending {
                order_id: order.id.clone(),
                requested,
            };
            self.metrics.record_transition(outcome_label(&error));
            return Err(error);
        };

        order.status = requested;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %requested,
            "Updating order status"
        );

        let started = Instant::now();
        let result = self.updater.update_status(&order.id, requested).await;
        self.metrics
            .observe_status_update(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                let event = OrderStatusChanged {
                    order_id: order.id.clone(),
                    from: previous,
                    to: requested,
                    actor,
                    changed_at: Utc::now(),
                };

                tracing::info!(
                    order_id = %order.id,
                    event_type = OrderStatusChanged::event_type(),
                    to = %requested,
                    "✅ Order status updated"
                );
                self.metrics.record_transition("accepted");
                Ok(event)
            }
            Err(error) => {
                tracing::error!(
                    order_id = %order.id,
                    to = %requested,
                    error = %error,
                    "Remote status update failed"
                );
                let error = OrderError::RemoteUpdateFailed {
                    order_id: order.id.clone(),
                    requested,
                    previous,
                    reason: error.to_string(),
                };
                self.metrics.record_transition(outcome_label(&error));
                Err(error)
            }
        }
    }
}

fn outcome_label(error: &OrderError) -> &'static str {
    match error {
        OrderError::Unauthorized { .. } => "unauthorized",
        OrderError::InvalidTransition { .. } => "invalid_transition",
        OrderError::TransitionPending { .. } => "pending",
        OrderError::RemoteUpdateFailed { .. } => "remote_failed",
        OrderError::MalformedRecord { .. } | OrderError::UnknownStatus(_) => "malformed",
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::domain::order::record::fixtures::order;
    use crate::domain::order::TransitionPolicy;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Records calls and, while running, whether the order was marked pending
    #[derive(Default)]
    struct RecordingUpdater {
        calls: Mutex<Vec<(String, OrderStatus)>>,
        pending_seen: Mutex<Vec<bool>>,
        watch: Option<PendingTransitions>,
        fail_with: Option<u16>,
        hold: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl OrderStatusUpdater for RecordingUpdater {
        async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push((order_id.to_string(), status));
            if let Some(pending) = &self.watch {
                self.pending_seen.lock().unwrap().push(pending.is_pending(order_id));
            }
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            match self.fail_with {
                Some(status) => Err(ApiError::Status {
                    status,
                    body: "boom".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    fn handler(updater: RecordingUpdater) -> StatusUpdateHandler<RecordingUpdater> {
        StatusUpdateHandler::new(
            updater,
            StatusTransitionGuard::default(),
            Arc::new(Metrics::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_successful_transition() {
        let handler = handler(RecordingUpdater::default());
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);

        let event = handler
            .apply_transition(&mut order, OrderStatus::InProgress, Role::RestaurantOwner)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(event.from, OrderStatus::Paid);
        assert_eq!(event.to, OrderStatus::InProgress);
        assert_eq!(
            *handler.updater.calls.lock().unwrap(),
            vec![("o1".to_string(), OrderStatus::InProgress)]
        );
        assert!(!handler.is_loading("o1"));
    }

    #[tokio::test]
    async fn test_customer_rejected_without_remote_call() {
        let handler = handler(RecordingUpdater::default());
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);

        let err = handler
            .apply_transition(&mut order, OrderStatus::InProgress, Role::Customer)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Unauthorized { .. }));
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(handler.updater.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_placed_target_rejected_without_remote_call() {
        let handler = handler(RecordingUpdater::default());
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::InProgress);

        let err = handler
            .apply_transition(&mut order, OrderStatus::Placed, Role::RestaurantOwner)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InvalidTransition { .. }));
        assert_eq!(order.status, OrderStatus::InProgress);
        assert!(handler.updater.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_optimistic_status_until_reverted() {
        let handler = handler(RecordingUpdater {
            fail_with: Some(500),
            ..Default::default()
        });
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);

        let err = handler
            .apply_transition(&mut order, OrderStatus::Delivered, Role::RestaurantOwner)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::RemoteUpdateFailed {
                requested: OrderStatus::Delivered,
                previous: OrderStatus::Paid,
                ..
            }
        ));
        assert_eq!(order.status, OrderStatus::Delivered);

        assert!(err.revert_status(&mut order));
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(!handler.is_loading("o1"));
        assert_eq!(handler.updater.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revert_ignores_other_orders() {
        let handler = handler(RecordingUpdater {
            fail_with: Some(503),
            ..Default::default()
        });
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);
        let err = handler
            .apply_transition(&mut order, OrderStatus::InProgress, Role::RestaurantOwner)
            .await
            .unwrap_err();

        let mut other = crate::domain::order::record::fixtures::order(
            "o2",
            "2024-01-02T09:00",
            OrderStatus::InProgress,
        );
        assert!(!err.revert_status(&mut other));
        assert_eq!(other.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_order_marked_loading_during_remote_call() {
        let pending = PendingTransitions::new();
        let handler = handler(RecordingUpdater {
            watch: Some(pending.clone()),
            ..Default::default()
        })
        .with_pending(pending.clone());
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);

        handler
            .apply_transition(&mut order, OrderStatus::OutForDelivery, Role::RestaurantOwner)
            .await
            .unwrap();

        assert_eq!(*handler.updater.pending_seen.lock().unwrap(), vec![true]);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_second_request_for_same_order_rejected_while_in_flight() {
        let hold = Arc::new(Notify::new());
        let handler = handler(RecordingUpdater {
            hold: Some(hold.clone()),
            ..Default::default()
        });
        let mut first = order("o1", "2024-01-02T09:00", OrderStatus::Paid);
        let mut second = first.clone();

        let (first_result, second_result, _) = tokio::join!(
            handler.apply_transition(&mut first, OrderStatus::InProgress, Role::RestaurantOwner),
            handler.apply_transition(&mut second, OrderStatus::Delivered, Role::RestaurantOwner),
            async { hold.notify_one() },
        );

        assert!(first_result.is_ok());
        assert!(matches!(
            second_result,
            Err(OrderError::TransitionPending { requested: OrderStatus::Delivered, .. })
        ));
        assert_eq!(second.status, OrderStatus::Paid);
        assert_eq!(handler.updater.calls.lock().unwrap().len(), 1);
        assert!(!handler.is_loading("o1"));
    }

    #[tokio::test]
    async fn test_forward_only_policy_enforced() {
        let handler = StatusUpdateHandler::new(
            RecordingUpdater::default(),
            StatusTransitionGuard::new(TransitionPolicy::ForwardOnly),
            Arc::new(Metrics::new().unwrap()),
        );
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Delivered);

        let err = handler
            .apply_transition(&mut order, OrderStatus::Paid, Role::RestaurantOwner)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_outcomes_recorded_in_metrics() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = StatusUpdateHandler::new(
            RecordingUpdater::default(),
            StatusTransitionGuard::default(),
            metrics.clone(),
        );
        let mut order = order("o1", "2024-01-02T09:00", OrderStatus::Paid);

        handler
            .apply_transition(&mut order, OrderStatus::InProgress, Role::RestaurantOwner)
            .await
            .unwrap();
        let _ = handler
            .apply_transition(&mut order, OrderStatus::Placed, Role::RestaurantOwner)
            .await;

        assert_eq!(metrics.transition_count("accepted"), 1);
        assert_eq!(metrics.transition_count("invalid_transition"), 1);
    }
}
