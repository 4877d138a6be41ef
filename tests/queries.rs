use axum_orders_api::{
    error::AppError,
    response::Meta,
    routes::params::{OrderListQuery, Pagination},
    services::order_service::{
        STATS_DEFAULT_DAYS, StatusTotals, parse_date_bound, resolve_stats_period, summarize_stats,
    },
};
use chrono::{Duration, TimeZone, Utc};

fn totals(status: &str, orders: i64, revenue: i64) -> StatusTotals {
    StatusTotals {
        status: status.to_string(),
        orders,
        revenue,
    }
}

#[test]
fn stats_over_empty_range_are_zero() {
    let stats = summarize_stats(&[]);
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.total_revenue, 0);
    assert_eq!(stats.average_order_value, 0.0);
    assert!(stats.status_breakdown.is_empty());

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "total_orders": 0,
            "total_revenue": 0,
            "average_order_value": 0.0,
            "status_breakdown": {}
        })
    );
}

#[test]
fn stats_sum_revenue_and_break_down_by_status() {
    let stats = summarize_stats(&[
        totals("pending", 2, 30),
        totals("delivered", 1, 25),
        totals("cancelled", 1, 5),
    ]);

    assert_eq!(stats.total_orders, 4);
    assert_eq!(stats.total_revenue, 60);
    assert!((stats.average_order_value - 15.0).abs() < f64::EPSILON);
    assert_eq!(stats.status_breakdown.get("pending"), Some(&2));
    assert_eq!(stats.status_breakdown.get("delivered"), Some(&1));
    assert_eq!(stats.status_breakdown.get("cancelled"), Some(&1));
    assert_eq!(stats.status_breakdown.get("shipped"), None);
}

#[test]
fn stats_saturate_instead_of_overflowing() {
    let stats = summarize_stats(&[
        totals("pending", 1, i64::MAX),
        totals("cancelled", 1, 1),
    ]);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_revenue, i64::MAX);
    assert!(stats.average_order_value > 0.0);
    assert_eq!(stats.status_breakdown.get("pending"), Some(&1));
}

#[test]
fn stats_period_defaults_to_last_thirty_days() {
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 8, 0, 0).unwrap();
    let period = resolve_stats_period(None, None, now).unwrap();
    assert_eq!(period.end_date, now);
    assert_eq!(period.start_date, now - Duration::days(STATS_DEFAULT_DAYS));

    let period = resolve_stats_period(Some("2024-06-01"), Some(""), now).unwrap();
    assert_eq!(
        period.start_date,
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(period.end_date, now);
}

#[test]
fn date_bounds_accept_rfc3339_and_plain_dates() {
    assert_eq!(parse_date_bound(None, "start_date").unwrap(), None);
    assert_eq!(parse_date_bound(Some("  "), "start_date").unwrap(), None);

    let ts = parse_date_bound(Some("2024-03-05T10:15:00+02:00"), "start_date")
        .unwrap()
        .unwrap();
    assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 8, 15, 0).unwrap());

    let day = parse_date_bound(Some("2024-03-05"), "end_date")
        .unwrap()
        .unwrap();
    assert_eq!(day, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());

    match parse_date_bound(Some("yesterday"), "end_date") {
        Err(AppError::BadRequest(msg)) => assert!(msg.contains("end_date")),
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), (1, 10, 0));
    assert_eq!(
        Pagination {
            page: Some(3),
            limit: Some(25)
        }
        .normalize(),
        (3, 25, 50)
    );
    assert_eq!(
        Pagination {
            page: Some(0),
            limit: Some(0)
        }
        .normalize(),
        (1, 10, 0)
    );
    assert_eq!(
        Pagination {
            page: Some(2),
            limit: Some(-5)
        }
        .normalize(),
        (2, 1, 1)
    );
    assert_eq!(
        Pagination {
            page: Some(-4),
            limit: Some(10_000)
        }
        .normalize(),
        (1, 100, 0)
    );
}

#[test]
fn huge_page_numbers_do_not_overflow_the_offset() {
    let (page, limit, offset) = Pagination {
        page: Some(i64::MAX),
        limit: Some(10),
    }
    .normalize();
    assert_eq!(page, i64::MAX);
    assert_eq!(limit, 10);
    assert_eq!(offset, i64::MAX);

    let meta = Meta::new(page, limit, 3);
    assert_eq!(meta.has_next, Some(false));
    assert_eq!(meta.has_prev, Some(true));
}

#[test]
fn list_query_exposes_its_pagination() {
    let query = OrderListQuery {
        page: Some(2),
        limit: Some(5),
        ..Default::default()
    };
    assert_eq!(query.pagination().normalize(), (2, 5, 5));
}

#[test]
fn meta_reports_pages_and_neighbours() {
    let meta = Meta::new(1, 10, 25);
    assert_eq!(meta.total_pages, Some(3));
    assert_eq!(meta.has_next, Some(true));
    assert_eq!(meta.has_prev, Some(false));

    let meta = Meta::new(3, 10, 25);
    assert_eq!(meta.has_next, Some(false));
    assert_eq!(meta.has_prev, Some(true));

    let meta = Meta::new(2, 10, 20);
    assert_eq!(meta.total_pages, Some(2));
    assert_eq!(meta.has_next, Some(false));

    let meta = Meta::new(1, 10, 0);
    assert_eq!(meta.total_pages, Some(0));
    assert_eq!(meta.has_next, Some(false));
    assert_eq!(meta.has_prev, Some(false));
}
