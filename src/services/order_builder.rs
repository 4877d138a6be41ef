use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DbErr, Set, SqlErr, TransactionTrait};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::{AddressInput, CreateOrderItem, CreateOrderRequest},
    entity::{order_items::ActiveModel as OrderItemActive, orders::ActiveModel as OrderActive},
    error::{AppError, AppResult},
    models::{Address, Order, OrderItem},
    response::{ApiResponse, Meta},
    services::now,
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

/// Attempts at inserting an order before giving up on finding a free order number.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let mut order = build_order(payload, now())?;

    for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
        match insert_order(&state.orm, &order).await {
            Ok(()) => {
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    user_id = %order.user_id,
                    total_amount = order.total_amount,
                    "order created"
                );
                return Ok(ApiResponse::success(
                    "Order created successfully",
                    order,
                    Some(Meta::empty()),
                ));
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::warn!(
                    order_number = %order.order_number,
                    attempt,
                    "order number collision, retrying"
                );
                order.order_number = generate_order_number(now());
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "no free order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
    )))
}

/// Validate a creation request and price it into a new `pending` order.
///
/// Checks run in a fixed order: required fields, non-empty items, then each
/// item. The billing address is resolved last and never fails. Nothing here
/// touches the database.
pub fn build_order(payload: CreateOrderRequest, now: DateTime<Utc>) -> AppResult<Order> {
    let CreateOrderRequest {
        user_id,
        items,
        shipping_address,
        billing_address,
        payment_method,
        notes,
    } = payload;

    let user_id = required(user_id, "user_id")?;
    let items = items.ok_or_else(|| AppError::MissingField("items".into()))?;
    let shipping_address =
        shipping_address.ok_or_else(|| AppError::MissingField("shipping_address".into()))?;
    let payment_method = required(payment_method, "payment_method")?;

    let shipping_address = build_address(shipping_address, "shipping_address")?;

    if items.is_empty() {
        return Err(AppError::EmptyItems);
    }

    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| price_item(index, item))
        .collect::<AppResult<Vec<_>>>()?;

    let mut total_amount: i64 = 0;
    for (index, item) in items.iter().enumerate() {
        total_amount = total_amount
            .checked_add(item.subtotal)
            .ok_or_else(|| AppError::InvalidItem {
                index,
                reason: "order total overflows".into(),
            })?;
    }

    let billing_address = match billing_address {
        Some(billing) => fill_address(billing, &shipping_address),
        None => shipping_address.clone(),
    };

    Ok(Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(now),
        user_id,
        items,
        total_amount,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        shipping_address,
        billing_address,
        payment_method,
        notes: notes.filter(|n| !n.trim().is_empty()),
        confirmed_at: None,
        shipped_at: None,
        delivered_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// `ORD-<epoch millis>-<3 random digits>`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().as_u128() % 1000;
    format!("ORD-{}-{suffix:03}", now.timestamp_millis())
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingField(field.to_string())),
    }
}

fn build_address(input: AddressInput, prefix: &str) -> AppResult<Address> {
    Ok(Address {
        street: required(input.street, &format!("{prefix}.street"))?,
        city: required(input.city, &format!("{prefix}.city"))?,
        state: required(input.state, &format!("{prefix}.state"))?,
        zip_code: required(input.zip_code, &format!("{prefix}.zip_code"))?,
        country: required(input.country, &format!("{prefix}.country"))?,
    })
}

/// Billing fields left blank take the shipping value.
fn fill_address(input: AddressInput, fallback: &Address) -> Address {
    let pick = |value: Option<String>, default: &String| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.clone())
    };
    Address {
        street: pick(input.street, &fallback.street),
        city: pick(input.city, &fallback.city),
        state: pick(input.state, &fallback.state),
        zip_code: pick(input.zip_code, &fallback.zip_code),
        country: pick(input.country, &fallback.country),
    }
}

fn price_item(index: usize, item: CreateOrderItem) -> AppResult<OrderItem> {
    let invalid = |reason: &str| AppError::InvalidItem {
        index,
        reason: reason.to_string(),
    };

    let product_id = item
        .product_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid("product_id is required"))?;
    let product_name = item
        .product_name
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid("product_name is required"))?;
    let quantity = match item.quantity.as_ref() {
        None => return Err(invalid("quantity is required")),
        Some(raw) => match raw.as_i64() {
            None => return Err(invalid("quantity must be a whole number")),
            Some(q) if q <= 0 => return Err(invalid("quantity must be greater than 0")),
            Some(q) => i32::try_from(q).map_err(|_| invalid("quantity is too large"))?,
        },
    };
    let price = match item.price.as_ref() {
        None => return Err(invalid("price is required")),
        Some(raw) => match raw.as_i64() {
            None => return Err(invalid("price must be a whole number of minor units")),
            Some(p) if p < 0 => return Err(invalid("price must not be negative")),
            Some(p) => p,
        },
    };
    // caller-supplied subtotal is discarded
    let subtotal = price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| invalid("subtotal overflows"))?;

    Ok(OrderItem {
        product_id,
        product_name,
        quantity,
        price,
        subtotal,
    })
}

/// Insert the order row and all item rows in one transaction.
async fn insert_order(conn: &OrmConn, order: &Order) -> Result<(), DbErr> {
    let shipping_address =
        serde_json::to_value(&order.shipping_address).map_err(|e| DbErr::Json(e.to_string()))?;
    let billing_address =
        serde_json::to_value(&order.billing_address).map_err(|e| DbErr::Json(e.to_string()))?;

    let txn = conn.begin().await?;

    OrderActive {
        id: Set(order.id),
        order_number: Set(order.order_number.clone()),
        user_id: Set(order.user_id.clone()),
        total_amount: Set(order.total_amount),
        status: Set(order.status.as_str().to_string()),
        payment_status: Set(order.payment_status.as_str().to_string()),
        shipping_address: Set(shipping_address),
        billing_address: Set(billing_address),
        payment_method: Set(order.payment_method.clone()),
        notes: Set(order.notes.clone()),
        confirmed_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        cancelled_at: Set(None),
        created_at: Set(order.created_at.into()),
        updated_at: Set(order.updated_at.into()),
    }
    .insert(&txn)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            position: Set(position as i32),
            product_id: Set(item.product_id.clone()),
            product_name: Set(item.product_name.clone()),
            quantity: Set(item.quantity),
            price: Set(item.price),
            subtotal: Set(item.subtotal),
            created_at: Set(order.created_at.into()),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
