use std::collections::HashMap;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use super::projection::bucket_orders;
use super::record::Order;
use super::value_objects::{Role, StatusFilter};

// ============================================================================
// View Model - what the order screens render
// ============================================================================

/// The three order list screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderTab {
    /// Customer's own orders, every status
    MyOrders,
    /// Restaurant's paid orders, with a status selector per order
    RestaurantOrders,
    /// Restaurant's orders placed but not paid
    RestaurantPlacedOrders,
}

impl OrderTab {
    pub fn role(&self) -> Role {
        match self {
            OrderTab::MyOrders => Role::Customer,
            OrderTab::RestaurantOrders | OrderTab::RestaurantPlacedOrders => Role::RestaurantOwner,
        }
    }

    pub fn status_filter(&self) -> StatusFilter {
        match self {
            OrderTab::MyOrders => StatusFilter::all(),
            OrderTab::RestaurantOrders => StatusFilter::restaurant_active(),
            OrderTab::RestaurantPlacedOrders => StatusFilter::placed_only(),
        }
    }

    pub fn shows_status_selector(&self) -> bool {
        matches!(self, OrderTab::RestaurantOrders)
    }

    pub fn badge_label(&self) -> &'static str {
        match self {
            OrderTab::RestaurantPlacedOrders => "Total placed",
            OrderTab::MyOrders | OrderTab::RestaurantOrders => "Total ordered",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderTab::MyOrders => "my-orders",
            OrderTab::RestaurantOrders => "restaurant-orders",
            OrderTab::RestaurantPlacedOrders => "restaurant-placed-orders",
        }
    }
}

/// Expanded/collapsed flag per date key. Owned by the caller; a day that was
/// never toggled is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandState(HashMap<String, bool>);

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, date_key: &str) -> bool {
        self.0.get(date_key).copied().unwrap_or(true)
    }

    /// Flip a day and return its new state
    pub fn toggle(&mut self, date_key: &str) -> bool {
        let expanded = !self.is_expanded(date_key);
        self.0.insert(date_key.to_string(), expanded);
        expanded
    }

    pub fn set(&mut self, date_key: impl Into<String>, expanded: bool) {
        self.0.insert(date_key.into(), expanded);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView<'a> {
    pub date_key: String,
    pub count: usize,
    pub expanded: bool,
    pub badge_label: &'static str,
    pub show_status_selector: bool,
    pub orders: Vec<&'a Order>,
}

impl<'a> GroupView<'a> {
    /// Orders to draw; nothing while collapsed
    pub fn visible_orders(&self) -> &[&'a Order] {
        if self.expanded {
            &self.orders
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListView<'a> {
    pub tab: OrderTab,
    /// Orders shown across all groups
    pub total: usize,
    /// Orders that matched the tab but could not be placed on a day
    pub skipped: usize,
    pub groups: Vec<GroupView<'a>>,
}

impl OrderListView<'_> {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Build the full screen model for `tab`
pub fn project_view<'a, Tz: TimeZone>(
    orders: &'a [Order],
    tab: OrderTab,
    expand_state: &ExpandState,
    tz: &Tz,
) -> OrderListView<'a> {
    let (groups, skipped) = bucket_orders(orders, &tab.status_filter(), tz);

    let groups: Vec<GroupView<'a>> = groups
        .into_iter()
        .map(|group| GroupView {
            count: group.len(),
            expanded: expand_state.is_expanded(&group.date_key),
            badge_label: tab.badge_label(),
            show_status_selector: tab.shows_status_selector(),
            date_key: group.date_key,
            orders: group.orders,
        })
        .collect();

    tracing::debug!(
        tab = tab.as_str(),
        groups = groups.len(),
        skipped,
        "Projected order view"
    );

    OrderListView {
        tab,
        total: groups.iter().map(|g| g.count).sum(),
        skipped,
        groups,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
