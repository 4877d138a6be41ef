use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::Order;

/// Address as submitted. Shipping fields are all required; billing gaps are
/// filled from the shipping address.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Numbers stay raw JSON so a malformed one is reported against its item index.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub quantity: Option<Value>,
    /// Unit price in minor currency units.
    #[schema(value_type = Option<i64>)]
    pub price: Option<Value>,
    /// Accepted for compatibility and ignored; subtotals are always recomputed.
    #[schema(value_type = Option<i64>)]
    pub subtotal: Option<Value>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    pub items: Option<Vec<CreateOrderItem>>,
    pub shipping_address: Option<AddressInput>,
    pub billing_address: Option<AddressInput>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    /// Status the caller last saw; the update is rejected if the order moved on.
    pub expected_status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_revenue: i64,
    pub average_order_value: f64,
    pub status_breakdown: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatsPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatsSummary {
    pub stats: OrderStats,
    pub period: StatsPeriod,
}
