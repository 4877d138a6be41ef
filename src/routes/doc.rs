use utoipa::{
    OpenApi,
    openapi::OpenApi as OpenApiSpec,
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        AddressInput, CreateOrderItem, CreateOrderRequest, OrderList, OrderStats,
        OrderStatsSummary, StatsPeriod, UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
    },
    models::{Address, Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::{health, orders, params},
    status::{OrderStatus, PaymentStatus},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::update_payment_status,
        orders::cancel_order,
        orders::list_user_orders,
        orders::order_stats
    ),
    components(
        schemas(
            Order,
            OrderItem,
            Address,
            OrderStatus,
            PaymentStatus,
            AddressInput,
            CreateOrderItem,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            OrderList,
            OrderStats,
            StatsPeriod,
            OrderStatsSummary,
            health::HealthData,
            params::Pagination,
            params::OrderListQuery,
            params::StatsQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderStatsSummary>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order lifecycle endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
