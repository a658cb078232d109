#![allow(dead_code)]

use chrono::Utc;
use common::create_test_connection;
use common::test_helpers::{TestError, TestResult};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use shop::dto::{group_flat_rows, OrderDto, OrderItemDto};
use shop::entities::{delivery, order, DeliveryStatus, OrderStatus};
use shop::model::{Address, ModelId, NewItem, NewMember, OrderLineRequest};
use shop::service::{ItemService, MemberService, OrderListing, OrderService, ProdShopService};
use shop::storage::create_schema;

pub const TEST_PAGE_LIMIT: u64 = 100;

/// Fresh in-memory database with the schema created.
pub async fn setup_service(batch_fetch_size: u64) -> TestResult<ProdShopService> {
    let db = create_test_connection().await?;
    create_schema(&db).await?;
    ProdShopService::new(db, batch_fetch_size, TEST_PAGE_LIMIT)
        .map_err(|e| TestError::generic(e.to_string()))
}

pub fn shop_err(e: shop::error::ShopError) -> TestError {
    TestError::generic(e.to_string())
}

pub async fn join_with_address(service: &ProdShopService, name: &str, city: &str) -> TestResult<ModelId> {
    service
        .join(NewMember::with_address(name, Address::new(city, "1", "1111")))
        .await
        .map_err(shop_err)
}

pub async fn add_item(service: &ProdShopService, name: &str, price: i32, stock: i32) -> TestResult<ModelId> {
    service
        .save_item(NewItem {
            name: name.to_string(),
            price,
            stock_quantity: stock,
        })
        .await
        .map_err(shop_err)
}

pub async fn place(service: &ProdShopService, member_id: ModelId, lines: &[(ModelId, i32)]) -> TestResult<ModelId> {
    let lines = lines
        .iter()
        .map(|&(item_id, count)| OrderLineRequest { item_id, count })
        .collect();
    service.order(member_id, lines).await.map_err(shop_err)
}

/// Ids of the orders created, ascending.
pub struct SampleShop {
    pub member_ids: Vec<ModelId>,
    pub order_ids: Vec<ModelId>,
}

/// Three members with one order each: userA buys two books, userB two
/// others, userC one book shared with userA.
pub async fn create_three_orders(service: &ProdShopService) -> TestResult<SampleShop> {
    let user_a = join_with_address(service, "userA", "Seoul").await?;
    let user_b = join_with_address(service, "userB", "Busan").await?;
    let user_c = join_with_address(service, "userC", "Incheon").await?;

    let jpa1 = add_item(service, "JPA1 BOOK", 10000, 100).await?;
    let jpa2 = add_item(service, "JPA2 BOOK", 20000, 100).await?;
    let spring1 = add_item(service, "SPRING1 BOOK", 20000, 100).await?;
    let spring2 = add_item(service, "SPRING2 BOOK", 40000, 100).await?;

    let first = place(service, user_a, &[(jpa1, 1), (jpa2, 2)]).await?;
    let second = place(service, user_b, &[(spring1, 3), (spring2, 4)]).await?;
    let third = place(service, user_c, &[(jpa1, 5)]).await?;

    Ok(SampleShop {
        member_ids: vec![user_a, user_b, user_c],
        order_ids: vec![first, second, third],
    })
}

/// Writes an order with a delivery but no order items, which the ordering
/// service never produces.
pub async fn insert_order_without_items(service: &ProdShopService, member_id: ModelId) -> TestResult<ModelId> {
    let db = service.db();
    let delivery = delivery::ActiveModel {
        id: NotSet,
        city: Set("Daegu".to_string()),
        street: Set("3".to_string()),
        zipcode: Set("3333".to_string()),
        status: Set(DeliveryStatus::Ready),
    }
    .insert(db)
    .await?;
    let order = order::ActiveModel {
        id: NotSet,
        member_id: Set(member_id),
        delivery_id: Set(delivery.id),
        order_date: Set(Utc::now().naive_utc()),
        status: Set(OrderStatus::Ordered),
    }
    .insert(db)
    .await?;
    Ok(order.id)
}

/// Brings every listing shape to `OrderDto`, sorted by order id.
pub fn normalize(listing: OrderListing) -> Vec<OrderDto> {
    let mut orders: Vec<OrderDto> = match listing {
        OrderListing::Entities(graphs) => graphs.iter().map(OrderDto::from).collect(),
        OrderListing::Orders(orders) => orders,
        OrderListing::Queried(orders) => orders.into_iter().map(from_query_dto).collect(),
        OrderListing::Flat(rows) => group_flat_rows(rows).into_iter().map(from_query_dto).collect(),
    };
    orders.sort_by_key(|o| o.order_id);
    orders
}

fn from_query_dto(dto: shop::dto::OrderQueryDto) -> OrderDto {
    OrderDto {
        order_id: dto.order_id,
        name: dto.name,
        order_date: dto.order_date,
        order_status: dto.order_status,
        address: dto.address,
        order_items: dto
            .order_items
            .into_iter()
            .map(|i| OrderItemDto {
                item_name: i.item_name,
                order_price: i.order_price,
                count: i.count,
            })
            .collect(),
    }
}
