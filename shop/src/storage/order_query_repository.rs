use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use std::collections::HashMap;
use tracing::debug;

use crate::dto::{OrderFlatDto, OrderItemQueryDto, OrderQueryDto};
use crate::entities::{delivery, item, member, order, order_item, OrderStatus};
use crate::error::ShopResult;
use crate::model::{Address, ModelId, Page};
use crate::storage::Session;

#[derive(Debug, FromQueryResult)]
struct OrderRootRow {
    order_id: ModelId,
    name: String,
    order_date: NaiveDateTime,
    order_status: OrderStatus,
    city: String,
    street: String,
    zipcode: String,
}

impl From<OrderRootRow> for OrderQueryDto {
    fn from(row: OrderRootRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: Address::new(row.city, row.street, row.zipcode),
            order_items: Vec::new(),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct OrderItemRow {
    order_id: ModelId,
    item_name: String,
    order_price: i32,
    count: i32,
}

impl From<OrderItemRow> for OrderItemQueryDto {
    fn from(row: OrderItemRow) -> Self {
        Self {
            order_id: row.order_id,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct OrderFlatRow {
    order_id: ModelId,
    name: String,
    order_date: NaiveDateTime,
    order_status: OrderStatus,
    city: String,
    street: String,
    zipcode: String,
    item_name: String,
    order_price: i32,
    count: i32,
}

impl From<OrderFlatRow> for OrderFlatDto {
    fn from(row: OrderFlatRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: Address::new(row.city, row.street, row.zipcode),
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

fn select_order_roots() -> Select<order::Entity> {
    order::Entity::find()
        .select_only()
        .column_as(order::Column::Id, "order_id")
        .column_as(member::Column::Name, "name")
        .column_as(order::Column::OrderDate, "order_date")
        .column_as(order::Column::Status, "order_status")
        .column_as(delivery::Column::City, "city")
        .column_as(delivery::Column::Street, "street")
        .column_as(delivery::Column::Zipcode, "zipcode")
        .join(JoinType::InnerJoin, order::Relation::Member.def())
        .join(JoinType::InnerJoin, order::Relation::Delivery.def())
        .order_by_asc(order::Column::Id)
}

fn select_order_items() -> Select<order_item::Entity> {
    order_item::Entity::find()
        .select_only()
        .column_as(order_item::Column::OrderId, "order_id")
        .column_as(item::Column::Name, "item_name")
        .column_as(order_item::Column::OrderPrice, "order_price")
        .column_as(order_item::Column::Count, "count")
        .join(JoinType::InnerJoin, order_item::Relation::Item.def())
        .order_by_asc(order_item::Column::Id)
}

/// Order roots projected with member name and delivery address, items empty.
pub async fn find_orders(session: &Session, page: Option<Page>) -> ShopResult<Vec<OrderQueryDto>> {
    let mut query = select_order_roots();
    if let Some(page) = page {
        query = query.offset(page.offset).limit(page.limit);
    }
    let rows = query.into_model::<OrderRootRow>().all(session).await?;
    Ok(rows.into_iter().map(OrderQueryDto::from).collect())
}

pub async fn find_order_items(session: &Session, order_id: ModelId) -> ShopResult<Vec<OrderItemQueryDto>> {
    let rows = select_order_items()
        .filter(order_item::Column::OrderId.eq(order_id))
        .into_model::<OrderItemRow>()
        .all(session)
        .await?;
    Ok(rows.into_iter().map(OrderItemQueryDto::from).collect())
}

/// Item projections of every order in `order_ids`, grouped by order id.
pub async fn find_order_item_map(
    session: &Session,
    order_ids: &[ModelId],
) -> ShopResult<HashMap<ModelId, Vec<OrderItemQueryDto>>> {
    let rows = select_order_items()
        .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
        .into_model::<OrderItemRow>()
        .all(session)
        .await?;

    let mut grouped: HashMap<ModelId, Vec<OrderItemQueryDto>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
}

/// One root query, then one item query per order: 1 + N statements.
pub async fn find_order_query_dtos(session: &Session, page: Option<Page>) -> ShopResult<Vec<OrderQueryDto>> {
    let mut orders = find_orders(session, page).await?;
    for order in &mut orders {
        order.order_items = find_order_items(session, order.order_id).await?;
    }
    Ok(orders)
}

/// One root query and a single IN query for the items of every order
/// returned: 2 statements, or 1 when there are no orders.
pub async fn find_all_by_dto_optimization(session: &Session, page: Option<Page>) -> ShopResult<Vec<OrderQueryDto>> {
    let mut orders = find_orders(session, page).await?;
    if orders.is_empty() {
        return Ok(orders);
    }

    let order_ids: Vec<ModelId> = orders.iter().map(|o| o.order_id).collect();
    let mut items = find_order_item_map(session, &order_ids).await?;
    for order in &mut orders {
        order.order_items = items.remove(&order.order_id).unwrap_or_default();
    }
    debug!(orders = orders.len(), "Attached item projections");
    Ok(orders)
}

/// Every (order, item) pair as one inner-joined row. Orders without items
/// do not appear.
pub async fn find_all_by_dto_flat(session: &Session) -> ShopResult<Vec<OrderFlatDto>> {
    let rows = select_order_roots()
        .column_as(item::Column::Name, "item_name")
        .column_as(order_item::Column::OrderPrice, "order_price")
        .column_as(order_item::Column::Count, "count")
        .join(JoinType::InnerJoin, order::Relation::OrderItems.def())
        .join(JoinType::InnerJoin, order_item::Relation::Item.def())
        .order_by_asc(order_item::Column::Id)
        .into_model::<OrderFlatRow>()
        .all(session)
        .await?;
    Ok(rows.into_iter().map(OrderFlatDto::from).collect())
}
