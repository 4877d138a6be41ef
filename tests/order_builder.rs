mod common;

use axum_orders_api::{
    dto::orders::CreateOrderRequest,
    error::AppError,
    services::order_builder::{build_order, generate_order_number},
    status::{OrderStatus, PaymentStatus},
};
use chrono::{TimeZone, Utc};
use common::{address, item, request};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn prices_items_and_totals_the_order() {
    let now = Utc::now();
    let order = build_order(
        request("user-1", vec![item("p1", 2, 10), item("p2", 1, 5)]),
        now,
    )
    .expect("valid order");

    assert_eq!(order.total_amount, 25);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items.len(), 2);
    for line in &order.items {
        assert_eq!(line.subtotal, line.price * i64::from(line.quantity));
    }
    assert_eq!(
        order.total_amount,
        order.items.iter().map(|i| i.subtotal).sum::<i64>()
    );
    assert_eq!(order.created_at, now);
    assert!(order.confirmed_at.is_none());
    assert!(order.cancelled_at.is_none());
}

#[test]
fn caller_supplied_subtotal_is_ignored() {
    let mut line = item("p1", 3, 7);
    line.subtotal = Some(1.into());

    let order = build_order(request("user-1", vec![line]), Utc::now()).unwrap();
    assert_eq!(order.items[0].subtotal, 21);
    assert_eq!(order.total_amount, 21);
}

#[test]
fn zero_price_items_are_allowed() {
    let order = build_order(request("user-1", vec![item("free", 4, 0)]), Utc::now()).unwrap();
    assert_eq!(order.total_amount, 0);
}

#[test]
fn items_keep_their_submitted_order() {
    let order = build_order(
        request("user-1", vec![item("c", 1, 1), item("a", 1, 1), item("b", 1, 1)]),
        Utc::now(),
    )
    .unwrap();
    let ids: Vec<_> = order.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);
}

#[test]
fn billing_address_defaults_to_shipping() {
    let order = build_order(request("user-1", vec![item("p1", 1, 1)]), Utc::now()).unwrap();
    assert_eq!(order.billing_address, order.shipping_address);

    let mut req = request("user-1", vec![item("p1", 1, 1)]);
    req.billing_address = Some(address("Shelbyville"));
    let order = build_order(req, Utc::now()).unwrap();
    assert_eq!(order.billing_address.city, "Shelbyville");
    assert_eq!(order.shipping_address.city, "Springfield");
}

#[test]
fn partial_billing_address_is_filled_from_shipping() {
    let mut billing = address("Shelbyville");
    billing.zip_code = None;
    billing.country = Some(String::new());
    let mut req = request("user-1", vec![item("p1", 1, 1)]);
    req.billing_address = Some(billing);

    let order = build_order(req, Utc::now()).unwrap();
    assert_eq!(order.billing_address.city, "Shelbyville");
    assert_eq!(order.billing_address.zip_code, order.shipping_address.zip_code);
    assert_eq!(order.billing_address.country, order.shipping_address.country);
}

#[test]
fn blank_notes_are_dropped() {
    let mut req = request("user-1", vec![item("p1", 1, 1)]);
    req.notes = Some("   ".into());
    assert_eq!(build_order(req, Utc::now()).unwrap().notes, None);

    let mut req = request("user-1", vec![item("p1", 1, 1)]);
    req.notes = Some("leave at door".into());
    assert_eq!(
        build_order(req, Utc::now()).unwrap().notes.as_deref(),
        Some("leave at door")
    );
}

#[test]
fn missing_fields_are_reported_by_name() {
    let mut cases: Vec<(&str, fn(&mut CreateOrderRequest))> = Vec::new();
    cases.push(("user_id", |r| r.user_id = None));
    cases.push(("user_id", |r| r.user_id = Some("  ".into())));
    cases.push(("items", |r| r.items = None));
    cases.push(("shipping_address", |r| r.shipping_address = None));
    cases.push(("payment_method", |r| r.payment_method = None));
    cases.push(("shipping_address.zip_code", |r| {
        if let Some(a) = r.shipping_address.as_mut() {
            a.zip_code = None;
        }
    }));

    for (field, mutate) in cases {
        let mut req = request("user-1", vec![item("p1", 1, 1)]);
        mutate(&mut req);
        match build_order(req, Utc::now()) {
            Err(AppError::MissingField(name)) => assert_eq!(name, field),
            other => panic!("expected MissingField({field}), got {other:?}"),
        }
    }
}

#[test]
fn missing_fields_are_checked_before_empty_items() {
    let mut req = request("user-1", vec![]);
    req.payment_method = None;
    assert!(matches!(
        build_order(req, Utc::now()),
        Err(AppError::MissingField(_))
    ));
}

#[test]
fn empty_items_are_rejected() {
    let err = build_order(request("user-1", vec![]), Utc::now()).unwrap_err();
    assert!(matches!(err, AppError::EmptyItems));
}

#[test]
fn incomplete_billing_address_does_not_mask_empty_items() {
    let mut billing = address("Shelbyville");
    billing.zip_code = None;
    let mut req = request("user-1", vec![]);
    req.billing_address = Some(billing);

    let err = build_order(req, Utc::now()).unwrap_err();
    assert!(matches!(err, AppError::EmptyItems), "got {err:?}");
}

#[test]
fn invalid_items_name_the_offending_index() {
    let mut no_name = item("p2", 1, 1);
    no_name.product_name = None;
    let mut no_price = item("p2", 1, 1);
    no_price.price = None;

    let cases = vec![
        (item("p2", 0, 10), "quantity"),
        (item("p2", -3, 10), "quantity"),
        (item("p2", 1, -1), "price"),
        (no_name, "product_name"),
        (no_price, "price"),
        (item("", 1, 1), "product_id"),
    ];

    for (bad, hint) in cases {
        let req = request("user-1", vec![item("p1", 1, 1), bad]);
        match build_order(req, Utc::now()) {
            Err(AppError::InvalidItem { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains(hint), "{reason} should mention {hint}");
            }
            other => panic!("expected InvalidItem, got {other:?}"),
        }
    }
}

#[test]
fn non_integer_numbers_are_reported_against_their_item() {
    let cases = [
        (json!(1.5), json!(10), "quantity"),
        (json!("2"), json!(10), "quantity"),
        (json!(1), json!(19.99), "price"),
        (json!(1), json!("10"), "price"),
        (json!(i64::from(i32::MAX) + 1), json!(1), "quantity"),
    ];

    for (quantity, price, hint) in cases {
        let body = json!({
            "user_id": "user-1",
            "items": [
                { "product_id": "p1", "product_name": "One", "quantity": 1, "price": 5 },
                { "product_id": "p2", "product_name": "Two", "quantity": quantity, "price": price, "subtotal": 3.5 }
            ],
            "shipping_address": {
                "street": "1 Main Street", "city": "Springfield", "state": "CA",
                "zip_code": "94000", "country": "US"
            },
            "payment_method": "credit_card"
        });
        let req: CreateOrderRequest = serde_json::from_value(body).expect("body deserializes");

        match build_order(req, Utc::now()) {
            Err(AppError::InvalidItem { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains(hint), "{reason} should mention {hint}");
            }
            other => panic!("expected InvalidItem, got {other:?}"),
        }
    }
}

#[test]
fn arithmetic_overflow_is_an_invalid_item() {
    let err = build_order(request("user-1", vec![item("p1", 2, i64::MAX)]), Utc::now()).unwrap_err();
    assert!(matches!(err, AppError::InvalidItem { index: 0, .. }));

    let err = build_order(
        request("user-1", vec![item("p1", 1, i64::MAX), item("p2", 1, 1)]),
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidItem { index: 1, .. }));
}

#[test]
fn order_number_has_prefix_millis_and_three_digit_suffix() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let number = generate_order_number(now);

    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3, "{number}");
    assert_eq!(parts[0], "ORD");
    assert_eq!(parts[1], now.timestamp_millis().to_string());
    assert_eq!(parts[2].len(), 3);
    assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn built_orders_get_distinct_ids() {
    let a = build_order(request("user-1", vec![item("p1", 1, 1)]), Utc::now()).unwrap();
    let b = build_order(request("user-1", vec![item("p1", 1, 1)]), Utc::now()).unwrap();
    assert_ne!(a.id, b.id);
}

proptest! {
    #[test]
    fn total_is_the_sum_of_quantity_times_price(
        lines in proptest::collection::vec((1..1_000i32, 0..1_000_000i64), 1..20)
    ) {
        let items = lines
            .iter()
            .enumerate()
            .map(|(i, (quantity, price))| item(&format!("p{i}"), *quantity, *price))
            .collect();
        let order = build_order(request("user-1", items), Utc::now()).unwrap();

        let expected: i64 = lines.iter().map(|(q, p)| i64::from(*q) * p).sum();
        prop_assert_eq!(order.total_amount, expected);
        for (line, (quantity, price)) in order.items.iter().zip(&lines) {
            prop_assert_eq!(line.quantity, *quantity);
            prop_assert_eq!(line.subtotal, i64::from(*quantity) * price);
        }
    }
}
