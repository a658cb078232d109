use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, RelationTrait, Select,
};
use std::collections::HashMap;
use tracing::debug;

use crate::entities::{delivery, item, member, order, order_item, DeliveryStatus, OrderStatus};
use crate::error::{ShopError, ShopResult};
use crate::model::{ModelId, OrderGraph, OrderLine, OrderSearch, Page, MAX_SEARCH_RESULTS};
use crate::storage::batch::{load_order_lines, BatchFetch};
use crate::storage::Session;

/// Order root plus both to-one relations, read from one joined row.
#[derive(Debug, FromQueryResult)]
struct OrderHeaderRow {
    order_id: ModelId,
    order_date: NaiveDateTime,
    status: OrderStatus,
    member_id: ModelId,
    member_name: String,
    member_city: Option<String>,
    member_street: Option<String>,
    member_zipcode: Option<String>,
    delivery_id: ModelId,
    delivery_city: String,
    delivery_street: String,
    delivery_zipcode: String,
    delivery_status: DeliveryStatus,
}

impl OrderHeaderRow {
    fn into_graph(self) -> OrderGraph {
        OrderGraph {
            order: order::Model {
                id: self.order_id,
                member_id: self.member_id,
                delivery_id: self.delivery_id,
                order_date: self.order_date,
                status: self.status,
            },
            member: member::Model {
                id: self.member_id,
                name: self.member_name,
                city: self.member_city,
                street: self.member_street,
                zipcode: self.member_zipcode,
            },
            delivery: delivery::Model {
                id: self.delivery_id,
                city: self.delivery_city,
                street: self.delivery_street,
                zipcode: self.delivery_zipcode,
                status: self.delivery_status,
            },
            order_items: Vec::new(),
        }
    }
}

/// Collection side of a collection fetch-join row; all columns are null for
/// an order without items.
#[derive(Debug, FromQueryResult)]
struct OrderLineRow {
    order_item_id: Option<ModelId>,
    order_item_order_price: Option<i32>,
    order_item_count: Option<i32>,
    item_id: Option<ModelId>,
    item_name: Option<String>,
    item_price: Option<i32>,
    item_stock_quantity: Option<i32>,
}

impl OrderLineRow {
    fn into_line(self, order_id: ModelId) -> ShopResult<Option<OrderLine>> {
        let Some(order_item_id) = self.order_item_id else {
            return Ok(None);
        };
        match (
            self.order_item_order_price,
            self.order_item_count,
            self.item_id,
            self.item_name,
            self.item_price,
            self.item_stock_quantity,
        ) {
            (Some(order_price), Some(count), Some(item_id), Some(name), Some(price), Some(stock_quantity)) => {
                Ok(Some(OrderLine {
                    order_item: order_item::Model {
                        id: order_item_id,
                        order_id,
                        item_id,
                        order_price,
                        count,
                    },
                    item: item::Model {
                        id: item_id,
                        name,
                        price,
                        stock_quantity,
                    },
                }))
            }
            _ => Err(ShopError::DataIntegrity(format!(
                "order item {} has no matching item row",
                order_item_id
            ))),
        }
    }
}

/// Orders with member and delivery fetch-joined. Both relations are to-one,
/// so the join yields exactly one row per order.
fn select_with_member_delivery() -> Select<order::Entity> {
    order::Entity::find()
        .select_only()
        .column_as(order::Column::Id, "order_id")
        .column_as(order::Column::OrderDate, "order_date")
        .column_as(order::Column::Status, "status")
        .column_as(member::Column::Id, "member_id")
        .column_as(member::Column::Name, "member_name")
        .column_as(member::Column::City, "member_city")
        .column_as(member::Column::Street, "member_street")
        .column_as(member::Column::Zipcode, "member_zipcode")
        .column_as(delivery::Column::Id, "delivery_id")
        .column_as(delivery::Column::City, "delivery_city")
        .column_as(delivery::Column::Street, "delivery_street")
        .column_as(delivery::Column::Zipcode, "delivery_zipcode")
        .column_as(delivery::Column::Status, "delivery_status")
        .join(JoinType::InnerJoin, order::Relation::Member.def())
        .join(JoinType::InnerJoin, order::Relation::Delivery.def())
        .order_by_asc(order::Column::Id)
}

/// Order root rows matching `search`, ascending by id, at most
/// `MAX_SEARCH_RESULTS` rows.
pub async fn search(session: &Session, search: &OrderSearch, page: Option<Page>) -> ShopResult<Vec<order::Model>> {
    let mut query = order::Entity::find().join(JoinType::InnerJoin, order::Relation::Member.def());
    if let Some(name) = search.member_name.as_deref().filter(|n| !n.is_empty()) {
        query = query.filter(member::Column::Name.contains(name));
    }
    if let Some(status) = search.order_status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query = query.order_by_asc(order::Column::Id);
    query = match page {
        Some(page) => query.offset(page.offset).limit(page.limit.min(MAX_SEARCH_RESULTS)),
        None => query.limit(MAX_SEARCH_RESULTS),
    };
    Ok(query.all(session).await?)
}

/// Resolves every relation of each order with its own statement, the way
/// lazy loading would: 1 + N (member) + N (delivery) + N (items
/// collection) + N×M (item) statements for N orders of M lines.
///
/// A missing member, delivery or item is a data integrity violation rather
/// than a silently dropped order.
pub async fn load_graphs_one_by_one(session: &Session, orders: Vec<order::Model>) -> ShopResult<Vec<OrderGraph>> {
    let mut graphs = Vec::with_capacity(orders.len());
    for order in orders {
        let member = order
            .find_related(member::Entity)
            .one(session)
            .await?
            .ok_or_else(|| ShopError::DataIntegrity(format!("order {} has no member", order.id)))?;
        let delivery = order
            .find_related(delivery::Entity)
            .one(session)
            .await?
            .ok_or_else(|| ShopError::DataIntegrity(format!("order {} has no delivery", order.id)))?;
        let order_items = order
            .find_related(order_item::Entity)
            .order_by_asc(order_item::Column::Id)
            .all(session)
            .await?;

        let mut lines = Vec::with_capacity(order_items.len());
        for order_item in order_items {
            let item = order_item
                .find_related(item::Entity)
                .one(session)
                .await?
                .ok_or_else(|| {
                    ShopError::DataIntegrity(format!("order item {} has no item", order_item.id))
                })?;
            lines.push(OrderLine { order_item, item });
        }

        graphs.push(OrderGraph {
            order,
            member,
            delivery,
            order_items: lines,
        });
    }
    Ok(graphs)
}

/// Orders with member, delivery, order items and items in one statement.
///
/// The collection join repeats each order once per item; rows are folded
/// back into one graph per order id, in first-seen order. There is no page
/// parameter: a row limit on this result set would cut through an order's
/// items instead of counting orders.
pub async fn find_all_with_item(session: &Session) -> ShopResult<Vec<OrderGraph>> {
    let stmt = select_with_member_delivery()
        .column_as(order_item::Column::Id, "order_item_id")
        .column_as(order_item::Column::OrderPrice, "order_item_order_price")
        .column_as(order_item::Column::Count, "order_item_count")
        .column_as(item::Column::Id, "item_id")
        .column_as(item::Column::Name, "item_name")
        .column_as(item::Column::Price, "item_price")
        .column_as(item::Column::StockQuantity, "item_stock_quantity")
        .join(JoinType::LeftJoin, order::Relation::OrderItems.def())
        .join(JoinType::LeftJoin, order_item::Relation::Item.def())
        .order_by_asc(order_item::Column::Id)
        .build(session.get_database_backend());

    let rows = session.query_all(stmt).await?;
    let row_count = rows.len();

    let mut graphs: Vec<OrderGraph> = Vec::new();
    let mut index: HashMap<ModelId, usize> = HashMap::new();
    for row in rows {
        let header = OrderHeaderRow::from_query_result(&row, "")?;
        let line = OrderLineRow::from_query_result(&row, "")?;
        let order_id = header.order_id;

        let position = *index.entry(order_id).or_insert_with(|| {
            graphs.push(header.into_graph());
            graphs.len() - 1
        });
        if let Some(line) = line.into_line(order_id)? {
            graphs[position].order_items.push(line);
        }
    }

    debug!(rows = row_count, orders = graphs.len(), "Folded collection fetch-join rows");
    Ok(graphs)
}

/// Orders with member and delivery fetch-joined, optionally paginated on the
/// order root. Item collections are left empty.
pub async fn find_all_with_member_delivery(session: &Session, page: Option<Page>) -> ShopResult<Vec<OrderGraph>> {
    let mut query = select_with_member_delivery();
    if let Some(page) = page {
        query = query.offset(page.offset).limit(page.limit);
    }
    let rows = query.into_model::<OrderHeaderRow>().all(session).await?;
    Ok(rows.into_iter().map(OrderHeaderRow::into_graph).collect())
}

/// Paginated to-one fetch-join followed by batched loading of the item
/// collections: 1 + ceil(N/K) + ceil(I/K) statements.
pub async fn find_all_with_member_delivery_batched(
    session: &Session,
    page: Page,
    batch: BatchFetch,
) -> ShopResult<Vec<OrderGraph>> {
    let mut graphs = find_all_with_member_delivery(session, Some(page)).await?;
    let order_ids: Vec<ModelId> = graphs.iter().map(|g| g.order.id).collect();
    let mut lines = load_order_lines(session, &order_ids, batch).await?;
    for graph in &mut graphs {
        graph.order_items = lines.remove(&graph.order.id).unwrap_or_default();
    }
    Ok(graphs)
}
