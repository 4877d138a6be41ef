use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    response::{ApiResponse, Meta},
    status::{OrderStatus, PaymentStatus},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Items array is required and cannot be empty")]
    EmptyItems,

    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    #[error("Cannot transition from {current} to {requested}")]
    IllegalTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Order cannot be cancelled")]
    NotCancellable { current: OrderStatus },

    #[error("Order status is {actual}, expected {expected}")]
    StatusConflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::MissingField(_)
            | AppError::EmptyItems
            | AppError::InvalidItem { .. }
            | AppError::InvalidStatus(_)
            | AppError::InvalidPaymentStatus(_)
            | AppError::IllegalTransition { .. }
            | AppError::NotCancellable { .. } => StatusCode::BAD_REQUEST,
            AppError::StatusConflict { .. } => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// State the caller needs to pick its next action without another read.
    pub fn details(&self) -> Option<Value> {
        match self {
            AppError::InvalidItem { index, .. } => Some(json!({ "index": index })),
            AppError::InvalidStatus(_) => Some(json!({
                "allowed_values": OrderStatus::ALL.map(|s| s.as_str()),
            })),
            AppError::InvalidPaymentStatus(_) => Some(json!({
                "allowed_values": PaymentStatus::ALL.map(|s| s.as_str()),
            })),
            AppError::IllegalTransition { current, requested } => Some(json!({
                "current_status": current,
                "requested_status": requested,
                "allowed_transitions": current.allowed_transitions(),
            })),
            AppError::NotCancellable { current } => Some(json!({
                "current_status": current,
                "allowed_statuses": OrderStatus::CANCELLABLE,
            })),
            AppError::StatusConflict { expected, actual } => Some(json!({
                "expected_status": expected,
                "current_status": actual,
            })),
            _ => None,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                details: self.details(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
