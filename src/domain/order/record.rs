use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::{CartItem, DeliveryDetails, OrderStatus, RestaurantRef};

// ============================================================================
// Order Record - as returned by the order API
// ============================================================================

/// Offset-less layouts the API has been seen to emit. They are read as
/// wall-clock time in the viewer's zone.
const LOCAL_LAYOUTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Raw creation timestamp; parsed per view so a bad value only drops
    /// this order
    pub created_at: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub delivery_details: DeliveryDetails,
    /// Minor currency units (pence)
    #[serde(default)]
    pub total_amount: u64,
    pub restaurant: RestaurantRef,
}

impl Order {
    /// Creation instant expressed in `tz`
    pub fn created_at_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<DateTime<Tz>, OrderError> {
        let raw = self.created_at.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Ok(instant.with_timezone(tz));
        }

        let naive = LOCAL_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
            .ok_or_else(|| self.malformed(format!("unparseable createdAt {raw:?}")))?;

        // Wall-clock times skipped by a DST jump are pushed forward an hour
        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .ok_or_else(|| self.malformed(format!("createdAt {raw:?} does not exist locally")))
    }

    /// Calendar day the order was created on, in `tz`
    pub fn created_on<Tz: TimeZone>(&self, tz: &Tz) -> Result<NaiveDate, OrderError> {
        Ok(self.created_at_in(tz)?.date_naive())
    }

    /// `YYYY-MM-DD HH:MM`, as order cards show it
    pub fn display_date_time<Tz: TimeZone>(&self, tz: &Tz) -> Result<String, OrderError> {
        Ok(self
            .created_at_in(tz)?
            .naive_local()
            .format("%Y-%m-%d %H:%M")
            .to_string())
    }

    /// Total in pounds, e.g. `£12.50`
    pub fn formatted_total(&self) -> String {
        format!("£{}.{:02}", self.total_amount / 100, self.total_amount % 100)
    }

    /// Placed orders were never paid for
    pub fn awaits_payment(&self) -> bool {
        self.status == OrderStatus::Placed
    }

    pub fn item_count(&self) -> u32 {
        self.cart_items.iter().map(|item| item.quantity).sum()
    }

    fn malformed(&self, reason: String) -> OrderError {
        OrderError::MalformedRecord {
            order_id: self.id.clone(),
            reason,
        }
    }
}
