use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;

use crate::domain::order::{Order, OrderStatus};

use super::{ApiError, OrderStatusUpdater};

#[derive(Serialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

pub struct OrderApiClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl OrderApiClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Orders placed by the signed-in customer
    pub async fn get_my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.fetch_orders("/api/order").await
    }

    /// Orders received by the signed-in owner's restaurant
    pub async fn get_my_restaurant_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.fetch_orders("/api/my/restaurant/order").await
    }

    async fn fetch_orders(&self, path: &str) -> Result<Vec<Order>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Fetching orders");

        let response = self.authorized(self.http.get(&url)).send().await?;
        let raw: Vec<Value> = check_status(response).await?.json().await?;
        let received = raw.len();
        let orders = decode_orders(raw);

        tracing::info!(
            url = %url,
            received,
            decoded = orders.len(),
            "Fetched orders"
        );
        Ok(orders)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl OrderStatusUpdater for OrderApiClient {
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<(), ApiError> {
        let url = format!("{}/api/my/restaurant/order/{}/status", self.base_url, order_id);

        let response = self
            .authorized(self.http.patch(&url))
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        check_status(response).await?;

        tracing::debug!(order_id, status = %status, "Order API accepted status update");
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode each element on its own so one bad record (unknown status,
/// missing field, negative total) does not hide the rest
pub fn decode_orders(raw: Vec<Value>) -> Vec<Order> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("<missing>")
                .to_string();

            match serde_json::from_value::<Order>(value) {
                Ok(order) => Some(order),
                Err(error) => {
                    tracing::warn!(
                        index,
                        order_id = %id,
                        error = %error,
                        "Skipping malformed order record"
                    );
                    None
                }
            }
        })
        .collect()
}
