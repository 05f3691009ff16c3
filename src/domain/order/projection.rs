use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Serialize;

use super::record::Order;
use super::value_objects::StatusFilter;

// ============================================================================
// Order View Projector
// ============================================================================
//
// Turns a flat order list into date groups:
// 1. keep orders whose status is in the filter
// 2. bucket by calendar day of creation in the viewer's zone
// 3. sort days newest first, then orders within a day newest first
//
// Nothing here mutates its input or keeps state between calls.
//
// ============================================================================

/// Orders created on one calendar day. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateGroup<'a> {
    pub date_key: String,
    pub orders: Vec<&'a Order>,
}

impl DateGroup<'_> {
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_ids(&self) -> Vec<&str> {
        self.orders.iter().map(|order| order.id.as_str()).collect()
    }
}

/// Zero-padded `YYYY-MM-DD`
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Group `orders` by local calendar day
pub fn project<'a>(orders: &'a [Order], filter: &StatusFilter) -> Vec<DateGroup<'a>> {
    project_in(orders, filter, &Local)
}

/// Same as [`project`], tolerating a list that was never loaded
pub fn project_optional<'a>(orders: Option<&'a [Order]>, filter: &StatusFilter) -> Vec<DateGroup<'a>> {
    orders.map(|orders| project(orders, filter)).unwrap_or_default()
}

/// Group `orders` by calendar day in `tz`
pub fn project_in<'a, Tz: TimeZone>(
    orders: &'a [Order],
    filter: &StatusFilter,
    tz: &Tz,
) -> Vec<DateGroup<'a>> {
    bucket_orders(orders, filter, tz).0
}

/// Grouped orders plus the number of matching orders dropped as malformed
pub(crate) fn bucket_orders<'a, Tz: TimeZone>(
    orders: &'a [Order],
    filter: &StatusFilter,
    tz: &Tz,
) -> (Vec<DateGroup<'a>>, usize) {
    let mut buckets: HashMap<NaiveDate, Vec<(DateTime<Tz>, &'a Order)>> = HashMap::new();
    let mut skipped = 0;

    for order in orders.iter().filter(|order| filter.contains(order.status)) {
        match order.created_at_in(tz) {
            Ok(created_at) => buckets
                .entry(created_at.date_naive())
                .or_default()
                .push((created_at, order)),
            Err(error) => {
                skipped += 1;
                tracing::warn!(
                    order_id = %order.id,
                    error = %error,
                    "Excluding malformed order from projection"
                );
            }
        }
    }

    let mut days: Vec<_> = buckets.into_iter().collect();
    days.sort_by(|(a, _), (b, _)| b.cmp(a));

    let groups = days
        .into_iter()
        .map(|(day, mut entries)| {
            // Stable sort keeps input order for identical timestamps
            entries.sort_by(|(a, _), (b, _)| b.cmp(a));
            DateGroup {
                date_key: date_key(day),
                orders: entries.into_iter().map(|(_, order)| order).collect(),
            }
        })
        .collect();

    (groups, skipped)
}

// ============================================================================
// Unit Tests
// ============================================================================
