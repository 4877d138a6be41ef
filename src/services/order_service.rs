use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::{OrderList, OrderStats, OrderStatsSummary, StatsPeriod},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    models::{Address, Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder, StatsQuery},
    services::{now, parse_order_status},
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

/// Default look-back window for statistics.
pub const STATS_DEFAULT_DAYS: i64 = 30;

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let model = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(model.id))
        .order_by_asc(OrderItemCol::Position)
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        order_from_entity(model, items)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = parse_order_status(status)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(start) = parse_date_bound(query.start_date.as_deref(), "start_date")? {
        condition = condition.add(OrderCol::CreatedAt.gte(start));
    }
    if let Some(end) = parse_date_bound(query.end_date.as_deref(), "end_date")? {
        condition = condition.add(OrderCol::CreatedAt.lte(end));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    fetch_page(state, condition, sort_order, query.pagination()).await
}

pub async fn list_user_orders(
    state: &AppState,
    user_id: &str,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user_id));
    fetch_page(state, condition, SortOrder::Desc, pagination).await
}

pub async fn order_stats(
    state: &AppState,
    query: StatsQuery,
) -> AppResult<ApiResponse<OrderStatsSummary>> {
    let period = resolve_stats_period(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        now(),
    )?;

    let rows = sqlx::query_as::<_, StatusTotals>(
        r#"
        SELECT status,
               COUNT(*)::BIGINT AS orders,
               LEAST(COALESCE(SUM(total_amount), 0), 9223372036854775807)::BIGINT AS revenue
        FROM orders
        WHERE created_at >= $1 AND created_at <= $2
        GROUP BY status
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&state.pool)
    .await?;

    let stats = summarize_stats(&rows);
    Ok(ApiResponse::success(
        "OK",
        OrderStatsSummary { stats, period },
        Some(Meta::empty()),
    ))
}

/// Per-status totals as returned by the aggregation query.
#[derive(Debug, Clone, FromRow)]
pub struct StatusTotals {
    pub status: String,
    pub orders: i64,
    pub revenue: i64,
}

/// Fold per-status totals into the statistics figures; empty input yields zeros.
///
/// Sums saturate at `i64::MAX` so the figures can always be produced.
pub fn summarize_stats(rows: &[StatusTotals]) -> OrderStats {
    let mut status_breakdown = BTreeMap::new();
    let mut total_orders: i64 = 0;
    let mut total_revenue: i64 = 0;
    for row in rows.iter().filter(|r| r.orders > 0) {
        total_orders = total_orders.saturating_add(row.orders);
        total_revenue = total_revenue.saturating_add(row.revenue);
        let count = status_breakdown.entry(row.status.clone()).or_insert(0_i64);
        *count = count.saturating_add(row.orders);
    }

    let average_order_value = if total_orders > 0 {
        total_revenue as f64 / total_orders as f64
    } else {
        0.0
    };

    OrderStats {
        total_orders,
        total_revenue,
        average_order_value,
        status_breakdown,
    }
}

pub fn resolve_stats_period(
    start_date: Option<&str>,
    end_date: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<StatsPeriod> {
    let start_date = parse_date_bound(start_date, "start_date")?
        .unwrap_or_else(|| now - Duration::days(STATS_DEFAULT_DAYS));
    let end_date = parse_date_bound(end_date, "end_date")?.unwrap_or(now);
    Ok(StatsPeriod {
        start_date,
        end_date,
    })
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date_bound(value: Option<&str>, field: &str) -> AppResult<Option<DateTime<Utc>>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date.and_time(NaiveTime::MIN).and_utc()));
    }
    Err(AppError::BadRequest(format!(
        "{field} must be an RFC 3339 timestamp or a YYYY-MM-DD date"
    )))
}

async fn fetch_page(
    state: &AppState,
    condition: Condition,
    sort_order: SortOrder,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let orders = attach_items(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

async fn attach_items(conn: &OrmConn, models: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    if !ids.is_empty() {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Position)
            .all(conn)
            .await?;
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
    }

    models
        .into_iter()
        .map(|model| {
            let items = grouped.remove(&model.id).unwrap_or_default();
            order_from_entity(model, items)
        })
        .collect()
}

pub(crate) fn order_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> AppResult<Order> {
    let status: OrderStatus = model.status.parse().map_err(|_| {
        anyhow::anyhow!("order {} has unknown status {:?}", model.id, model.status)
    })?;
    let payment_status: PaymentStatus = model.payment_status.parse().map_err(|_| {
        anyhow::anyhow!(
            "order {} has unknown payment status {:?}",
            model.id,
            model.payment_status
        )
    })?;
    let shipping_address: Address =
        serde_json::from_value(model.shipping_address).map_err(anyhow::Error::from)?;
    let billing_address: Address =
        serde_json::from_value(model.billing_address).map_err(anyhow::Error::from)?;

    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        items: items.into_iter().map(order_item_from_entity).collect(),
        total_amount: model.total_amount,
        status,
        payment_status,
        shipping_address,
        billing_address,
        payment_method: model.payment_method,
        notes: model.notes,
        confirmed_at: model.confirmed_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        price: model.price,
        subtotal: model.subtotal,
    }
}
