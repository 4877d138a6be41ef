use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::orders::{UpdateOrderStatusRequest, UpdatePaymentStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    models::Order,
    response::{ApiResponse, Meta},
    services::{now, order_service::order_from_entity, parse_order_status, parse_payment_status},
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

/// Move `order` to `requested` if the transition table allows it.
///
/// On success the status timestamp for `requested` is stamped if it was unset.
/// On failure the order is left untouched.
pub fn apply_transition(
    order: &mut Order,
    requested: OrderStatus,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let current = order.status;
    if !current.can_transition_to(requested) {
        return Err(AppError::IllegalTransition { current, requested });
    }

    order.status = requested;
    stamp_status_entry(order, requested, now);
    order.updated_at = now;
    Ok(())
}

/// Cancellation restricted to orders that have not started processing.
///
/// Narrower than the transition table, which also lets `processing` and
/// `shipped` orders be cancelled through [`apply_transition`].
pub fn apply_cancel(order: &mut Order, now: DateTime<Utc>) -> AppResult<()> {
    if !order.status.is_cancellable() {
        return Err(AppError::NotCancellable {
            current: order.status,
        });
    }
    apply_transition(order, OrderStatus::Cancelled, now)
}

/// Payment status has no transition table and is never checked against fulfillment.
pub fn apply_payment_status(order: &mut Order, requested: PaymentStatus, now: DateTime<Utc>) {
    order.payment_status = requested;
    order.updated_at = now;
}

fn stamp_status_entry(order: &mut Order, status: OrderStatus, now: DateTime<Utc>) {
    let slot = match status {
        OrderStatus::Confirmed => &mut order.confirmed_at,
        OrderStatus::Shipped => &mut order.shipped_at,
        OrderStatus::Delivered => &mut order.delivered_at,
        OrderStatus::Cancelled => &mut order.cancelled_at,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(now);
    }
}

pub async fn transition_status(
    state: &AppState,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let (model, mut order) = lock_order(&txn, id).await?;

    let requested = parse_order_status(&payload.status)?;
    if let Some(expected) = payload.expected_status.as_deref() {
        let expected = parse_order_status(expected)?;
        if expected != order.status {
            return Err(AppError::StatusConflict {
                expected,
                actual: order.status,
            });
        }
    }

    let from = order.status;
    if let Err(err) = apply_transition(&mut order, requested, now()) {
        tracing::debug!(order_id = %id, from = %from, to = %requested, "transition rejected");
        return Err(err);
    }
    save_lifecycle(&txn, model, &order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        from = %from,
        to = %order.status,
        "order status updated"
    );

    Ok(ApiResponse::success(
        "Order status updated successfully",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let (model, mut order) = lock_order(&txn, id).await?;

    let from = order.status;
    apply_cancel(&mut order, now())?;
    save_lifecycle(&txn, model, &order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        from = %from,
        "order cancelled"
    );

    Ok(ApiResponse::success(
        "Order cancelled successfully",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_status(
    state: &AppState,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let requested = parse_payment_status(&payload.payment_status)?;

    let txn = state.orm.begin().await?;
    let (model, mut order) = lock_order(&txn, id).await?;

    let from = order.payment_status;
    apply_payment_status(&mut order, requested, now());
    save_lifecycle(&txn, model, &order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        from = %from,
        to = %order.payment_status,
        "payment status updated"
    );

    Ok(ApiResponse::success(
        "Payment status updated successfully",
        order,
        Some(Meta::empty()),
    ))
}

/// Load an order with its items, holding a row lock until the transaction ends.
async fn lock_order(txn: &DatabaseTransaction, id: Uuid) -> AppResult<(OrderModel, Order)> {
    let model = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .order_by_asc(OrderItemCol::Position)
        .all(txn)
        .await?;

    let order = order_from_entity(model.clone(), items)?;
    Ok((model, order))
}

/// Write back the fields the lifecycle controller owns.
async fn save_lifecycle(
    txn: &DatabaseTransaction,
    model: OrderModel,
    order: &Order,
) -> AppResult<()> {
    let mut active: OrderActive = model.into();
    active.status = Set(order.status.as_str().to_string());
    active.payment_status = Set(order.payment_status.as_str().to_string());
    active.confirmed_at = Set(order.confirmed_at.map(Into::into));
    active.shipped_at = Set(order.shipped_at.map(Into::into));
    active.delivered_at = Set(order.delivered_at.map(Into::into));
    active.cancelled_at = Set(order.cancelled_at.map(Into::into));
    active.updated_at = Set(order.updated_at.into());
    active.update(txn).await?;
    Ok(())
}
