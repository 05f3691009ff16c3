use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Lifecycle status of an order.
///
/// Variants are declared in lifecycle order, so the derived `Ord` follows
/// `placed < paid < inProgress < outForDelivery < delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Placed,
    Paid,
    InProgress,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Paid,
        OrderStatus::InProgress,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Wire name, as the order API spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Paid => "paid",
            OrderStatus::InProgress => "inProgress",
            OrderStatus::OutForDelivery => "outForDelivery",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Human readable label shown on status headers and selectors
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Paid => "Awaiting Restaurant Confirmation",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Progress bar value (0-100)
    pub fn progress_value(&self) -> u8 {
        match self {
            OrderStatus::Placed => 0,
            OrderStatus::Paid => 25,
            OrderStatus::InProgress => 50,
            OrderStatus::OutForDelivery => 75,
            OrderStatus::Delivered => 100,
        }
    }

    /// `placed` is only reachable through order creation
    pub fn is_selectable_target(&self) -> bool {
        !matches!(self, OrderStatus::Placed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Who is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Customer,
    RestaurantOwner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::RestaurantOwner => f.write_str("restaurant-owner"),
        }
    }
}

/// Set of statuses an order list should show
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusFilter(BTreeSet<OrderStatus>);

impl StatusFilter {
    pub fn new(statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        Self(statuses.into_iter().collect())
    }

    /// Everything, as the customer's order status screen shows it
    pub fn all() -> Self {
        Self::new(OrderStatus::ALL)
    }

    /// Orders a restaurant has been paid for
    pub fn restaurant_active() -> Self {
        Self::new([
            OrderStatus::Paid,
            OrderStatus::InProgress,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ])
    }

    /// Orders placed but never paid
    pub fn placed_only() -> Self {
        Self::new([OrderStatus::Placed])
    }

    pub fn contains(&self, status: OrderStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = OrderStatus> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<OrderStatus> for StatusFilter {
    fn from_iter<I: IntoIterator<Item = OrderStatus>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_item_id: Option<String>,
    pub name: String,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub name: String,
    pub address_line1: String,
    pub city: String,
    #[serde(default)]
    pub email: String,
}

/// Restaurant the order was placed with
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub image_url: String,
}

// ============================================================================
// Unit Tests
// ============================================================================
