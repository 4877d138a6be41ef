#![allow(dead_code)]

use axum_orders_api::dto::orders::{AddressInput, CreateOrderItem, CreateOrderRequest};

pub fn item(product_id: &str, quantity: i32, price: i64) -> CreateOrderItem {
    CreateOrderItem {
        product_id: Some(product_id.to_string()),
        product_name: Some(format!("Product {product_id}")),
        quantity: Some(quantity.into()),
        price: Some(price.into()),
        subtotal: None,
    }
}

pub fn address(city: &str) -> AddressInput {
    AddressInput {
        street: Some("1 Main Street".into()),
        city: Some(city.into()),
        state: Some("CA".into()),
        zip_code: Some("94000".into()),
        country: Some("US".into()),
    }
}

pub fn request(user_id: &str, items: Vec<CreateOrderItem>) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: Some(user_id.to_string()),
        items: Some(items),
        shipping_address: Some(address("Springfield")),
        billing_address: None,
        payment_method: Some("credit_card".into()),
        notes: None,
    }
}
