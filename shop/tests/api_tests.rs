mod test_utils;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::Router;
use common::test_helpers::test_utils::{build_request, check_status_code, serialize_json};
use common::test_helpers::{TestError, TestResult};
use common::{test_assert, test_assert_eq};
use http_body_util::BodyExt;
use mockall::mock;
use sea_orm::DbErr;
use serde_json::{json, Value};
use shop::dto::SimpleOrderDto;
use shop::entities::{item, member, order, OrderStatus};
use shop::error::{ShopError, ShopResult};
use shop::api::{create_router, AppState};
use shop::model::{ModelId, NewItem, NewMember, OrderLineRequest, OrderSearch};
use shop::service::{
    ItemService, MemberService, OrderListing, OrderQuery, OrderQueryService, OrderQueryStyle,
    OrderService, SimpleOrderStyle,
};
use tower::ServiceExt;
use test_utils::*;

mock! {
    pub Shop {}

    #[async_trait]
    impl MemberService for Shop {
        async fn join(&self, member: NewMember) -> ShopResult<ModelId>;
        async fn find_members(&self) -> ShopResult<Vec<member::Model>>;
        async fn find_member(&self, id: ModelId) -> ShopResult<member::Model>;
        async fn update_member_name(&self, id: ModelId, name: String) -> ShopResult<member::Model>;
    }

    #[async_trait]
    impl ItemService for Shop {
        async fn save_item(&self, item: NewItem) -> ShopResult<ModelId>;
        async fn update_item(&self, id: ModelId, item: NewItem) -> ShopResult<item::Model>;
        async fn find_items(&self) -> ShopResult<Vec<item::Model>>;
        async fn find_item(&self, id: ModelId) -> ShopResult<item::Model>;
    }

    #[async_trait]
    impl OrderService for Shop {
        async fn order(&self, member_id: ModelId, lines: Vec<OrderLineRequest>) -> ShopResult<ModelId>;
        async fn cancel(&self, order_id: ModelId) -> ShopResult<()>;
        async fn complete_delivery(&self, order_id: ModelId) -> ShopResult<()>;
        async fn search(&self, search: OrderSearch) -> ShopResult<Vec<order::Model>>;
    }

    #[async_trait]
    impl OrderQueryService for Shop {
        async fn list_orders(&self, query: OrderQuery) -> ShopResult<OrderListing>;
        async fn list_simple_orders(&self, style: SimpleOrderStyle) -> ShopResult<Vec<SimpleOrderDto>>;
    }
}

const CORS_ORIGIN: &str = "http://localhost:5173";

fn mock_app(shop: MockShop) -> TestResult<Router> {
    let shop = Arc::new(shop);
    let state = AppState::new(shop.clone(), shop.clone(), shop.clone(), shop);
    create_router(state, CORS_ORIGIN).map_err(|e| TestError::generic(e.to_string()))
}

async fn sqlite_app() -> TestResult<Router> {
    let service = Arc::new(setup_service(2).await?);
    let state = AppState::new(service.clone(), service.clone(), service.clone(), service);
    create_router(state, CORS_ORIGIN).map_err(|e| TestError::generic(e.to_string()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<String>) -> TestResult<(StatusCode, Value)> {
    let request = build_request(method, uri, body)?.map(Body::from);
    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| TestError::generic(e.to_string()))?;
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| TestError::generic(e.to_string()))?
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, body))
}

#[tokio::test]
async fn test_pagination_conflict_is_bad_request() -> TestResult {
    let mut shop = MockShop::new();
    shop.expect_list_orders()
        .withf(|query| query.style == OrderQueryStyle::CollectionFetchJoin && query.offset == Some(0))
        .times(1)
        .returning(|_| Err(ShopError::PaginationConflict { style: "v3" }));
    let app = mock_app(shop)?;

    let (status, body) = send(&app, "GET", "/orders?style=v3&offset=0", None).await?;
    check_status_code(status, StatusCode::BAD_REQUEST)?;
    test_assert!(body["error"].as_str().is_some_and(|m| m.contains("v3")));
    Ok(())
}

#[tokio::test]
async fn test_error_status_mapping() -> TestResult {
    let mut shop = MockShop::new();
    shop.expect_find_member()
        .returning(|id| Err(ShopError::NotFound { entity: "member".to_string(), id }));
    shop.expect_join()
        .returning(|m| Err(ShopError::DuplicateMember(m.name)));
    shop.expect_cancel().returning(|order_id| {
        Err(ShopError::OrderNotCancellable {
            order_id,
            reason: "delivery already completed",
        })
    });
    shop.expect_find_items()
        .returning(|| Err(ShopError::Database(DbErr::Custom("disk on fire".to_string()))));
    let app = mock_app(shop)?;

    let (status, _) = send(&app, "GET", "/members/9", None).await?;
    check_status_code(status, StatusCode::NOT_FOUND)?;

    let (status, body) = send(&app, "POST", "/members", Some(json!({"name": "kim"}).to_string())).await?;
    check_status_code(status, StatusCode::CONFLICT)?;
    test_assert_eq!(body["error"], json!("Member already exists: kim"));

    let (status, _) = send(&app, "POST", "/orders/3/cancel", None).await?;
    check_status_code(status, StatusCode::BAD_REQUEST)?;

    let (status, body) = send(&app, "GET", "/items", None).await?;
    check_status_code(status, StatusCode::INTERNAL_SERVER_ERROR)?;
    test_assert!(
        !body["error"].as_str().unwrap_or_default().contains("disk on fire"),
        "storage detail must stay in the logs"
    );
    Ok(())
}

#[tokio::test]
async fn test_query_string_reaches_service() -> TestResult {
    let mut shop = MockShop::new();
    shop.expect_list_orders()
        .withf(|query| {
            query.style == OrderQueryStyle::DtoTraversal
                && query.search.member_name.as_deref() == Some("user")
                && query.search.order_status == Some(OrderStatus::Cancelled)
                && query.limit == Some(5)
        })
        .times(1)
        .returning(|_| Ok(OrderListing::Orders(Vec::new())));
    shop.expect_list_simple_orders()
        .withf(|style| *style == SimpleOrderStyle::Projection)
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let app = mock_app(shop)?;

    let (status, body) = send(
        &app,
        "GET",
        "/orders?style=v2&memberName=user&orderStatus=CANCELLED&limit=5",
        None,
    )
    .await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(body, json!([]));

    let (status, _) = send(&app, "GET", "/simple-orders", None).await?;
    check_status_code(status, StatusCode::OK)?;
    Ok(())
}

#[tokio::test]
async fn test_unknown_style_rejected_before_service() -> TestResult {
    let app = mock_app(MockShop::new())?;
    for uri in [
        "/orders?style=v9",
        "/orders?style=v5&limit=ten",
        "/orders?offset=18446744073709551616",
        "/simple-orders?style=v6",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await?;
        check_status_code(status, StatusCode::BAD_REQUEST)?;
        test_assert!(body["error"].as_str().is_some(), "{} must answer a JSON error body", uri);
    }
    Ok(())
}

#[tokio::test]
async fn test_oversized_window_is_bad_request() -> TestResult {
    let app = sqlite_app().await?;
    for uri in [
        "/orders?style=v3.1&limit=18446744073709551615",
        "/orders?style=v5&offset=9223372036854775808",
        "/orders?style=v1&limit=9223372036854775808",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await?;
        check_status_code(status, StatusCode::BAD_REQUEST)?;
        test_assert!(body["error"].as_str().is_some_and(|m| m.contains("must not exceed")));
    }

    let (status, _) = send(&app, "GET", "/orders?style=v4&offset=9223372036854775807&limit=1", None).await?;
    check_status_code(status, StatusCode::OK)?;
    Ok(())
}

#[tokio::test]
async fn test_health() -> TestResult {
    let app = mock_app(MockShop::new())?;
    let (status, body) = send(&app, "GET", "/health", None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(body, json!("OK"));
    Ok(())
}

#[tokio::test]
async fn test_member_and_order_flow_end_to_end() -> TestResult {
    let app = sqlite_app().await?;

    let body = serialize_json(&json!({"name": "userA", "city": "Seoul", "street": "1", "zipcode": "1111"}))?;
    let (status, created) = send(&app, "POST", "/members", Some(body.clone())).await?;
    check_status_code(status, StatusCode::OK)?;
    let member_id = created["id"].as_i64().ok_or_else(|| TestError::generic("missing member id"))?;

    let (status, _) = send(&app, "POST", "/members", Some(body)).await?;
    check_status_code(status, StatusCode::CONFLICT)?;

    let (status, member) = send(&app, "GET", &format!("/members/{}", member_id), None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(member["address"]["city"], json!("Seoul"));

    let mut item_ids = Vec::new();
    for (name, price) in [("JPA1 BOOK", 10000), ("JPA2 BOOK", 20000)] {
        let body = serialize_json(&json!({"name": name, "price": price, "stockQuantity": 100}))?;
        let (status, created) = send(&app, "POST", "/items", Some(body)).await?;
        check_status_code(status, StatusCode::OK)?;
        item_ids.push(created["id"].clone());
    }

    let body = serialize_json(&json!({
        "memberId": member_id,
        "items": [{"itemId": item_ids[0], "count": 1}, {"itemId": item_ids[1], "count": 2}]
    }))?;
    let (status, created) = send(&app, "POST", "/orders", Some(body)).await?;
    check_status_code(status, StatusCode::OK)?;
    let order_id = created["id"].clone();

    let (status, orders) = send(&app, "GET", "/orders?style=v5", None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(orders[0]["orderId"], order_id);
    test_assert_eq!(orders[0]["name"], json!("userA"));
    test_assert_eq!(orders[0]["orderStatus"], json!("ORDERED"));
    test_assert_eq!(orders[0]["address"]["zipcode"], json!("1111"));
    test_assert_eq!(
        orders[0]["orderItems"],
        json!([
            {"itemName": "JPA1 BOOK", "orderPrice": 10000, "count": 1},
            {"itemName": "JPA2 BOOK", "orderPrice": 20000, "count": 2}
        ])
    );

    let (status, _) = send(&app, "GET", "/orders?style=v6&limit=1", None).await?;
    check_status_code(status, StatusCode::BAD_REQUEST)?;

    let (status, flat) = send(&app, "GET", "/orders?style=v6", None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(flat.as_array().map(Vec::len), Some(2));
    test_assert_eq!(flat[1]["itemName"], json!("JPA2 BOOK"));

    let (status, simple) = send(&app, "GET", "/simple-orders?style=v3", None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert!(simple[0].get("orderItems").is_none());

    let (status, _) = send(&app, "POST", &format!("/orders/{}/cancel", order_id), None).await?;
    check_status_code(status, StatusCode::NO_CONTENT)?;

    let (status, item) = send(&app, "GET", &format!("/items/{}", item_ids[1]), None).await?;
    check_status_code(status, StatusCode::OK)?;
    test_assert_eq!(item["stockQuantity"], json!(100));
    Ok(())
}
