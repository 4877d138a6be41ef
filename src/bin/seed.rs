use axum_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{AddressInput, CreateOrderItem, CreateOrderRequest, UpdateOrderStatusRequest},
    services::{lifecycle_service, order_builder},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let state = AppState { pool, orm };

    let orders = vec![
        ("user-1001", vec![("SKU-HOODIE", "Axum Hoodie", 1, 5500), ("SKU-MUG", "Ferris Mug", 2, 1200)]),
        ("user-1002", vec![("SKU-STICKERS", "Rust Sticker Pack", 3, 500)]),
        ("user-1001", vec![("SKU-EBOOK", "E-book: Async Rust", 1, 2500)]),
    ];

    let mut created = Vec::new();
    for (user_id, items) in orders {
        let resp = order_builder::create_order(&state, demo_request(user_id, items)).await?;
        if let Some(order) = resp.data {
            println!("Created {} for {} (total {})", order.order_number, user_id, order.total_amount);
            created.push(order.id);
        }
    }

    // Walk the first order through fulfillment.
    if let Some(id) = created.first().copied() {
        for status in ["confirmed", "processing", "shipped"] {
            lifecycle_service::transition_status(
                &state,
                id,
                UpdateOrderStatusRequest {
                    status: status.to_string(),
                    expected_status: None,
                },
            )
            .await?;
            println!("Order {id} -> {status}");
        }
    }

    println!("Seed completed");
    Ok(())
}

fn demo_request(user_id: &str, items: Vec<(&str, &str, i32, i64)>) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: Some(user_id.to_string()),
        items: Some(
            items
                .into_iter()
                .map(|(product_id, product_name, quantity, price)| CreateOrderItem {
                    product_id: Some(product_id.to_string()),
                    product_name: Some(product_name.to_string()),
                    quantity: Some(quantity.into()),
                    price: Some(price.into()),
                    subtotal: None,
                })
                .collect(),
        ),
        shipping_address: Some(AddressInput {
            street: Some("1 Crab Street".into()),
            city: Some("Portland".into()),
            state: Some("OR".into()),
            zip_code: Some("97201".into()),
            country: Some("US".into()),
        }),
        billing_address: None,
        payment_method: Some("credit_card".into()),
        notes: None,
    }
}
