use chrono::{DateTime, SubsecRound, Utc};

use crate::{
    error::{AppError, AppResult},
    status::{OrderStatus, PaymentStatus},
};

pub mod lifecycle_service;
pub mod order_builder;
pub mod order_service;

/// Current time at the precision Postgres stores, so values read back compare equal.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn parse_order_status(raw: &str) -> AppResult<OrderStatus> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidStatus(raw.to_string()))
}

pub fn parse_payment_status(raw: &str) -> AppResult<PaymentStatus> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidPaymentStatus(raw.to_string()))
}
