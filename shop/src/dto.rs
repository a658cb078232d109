//! Response shapes handed to the HTTP layer.
//!
//! None of these types carry a back-reference to their parent, so
//! serializing them can never recurse.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::entities::{item, member, OrderStatus};
use crate::model::{Address, ModelId, OrderGraph, OrderLine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub order_id: ModelId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemDto>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

impl From<&OrderLine> for OrderItemDto {
    fn from(line: &OrderLine) -> Self {
        Self {
            item_name: line.item.name.clone(),
            order_price: line.order_item.order_price,
            count: line.order_item.count,
        }
    }
}

impl From<&OrderGraph> for OrderDto {
    fn from(graph: &OrderGraph) -> Self {
        Self {
            order_id: graph.order.id,
            name: graph.member.name.clone(),
            order_date: graph.order.order_date,
            order_status: graph.order.status,
            address: graph.delivery.address(),
            order_items: graph.order_items.iter().map(OrderItemDto::from).collect(),
        }
    }
}

/// Order header without its items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOrderDto {
    pub order_id: ModelId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
}

impl From<&OrderGraph> for SimpleOrderDto {
    fn from(graph: &OrderGraph) -> Self {
        Self {
            order_id: graph.order.id,
            name: graph.member.name.clone(),
            order_date: graph.order.order_date,
            order_status: graph.order.status,
            address: graph.delivery.address(),
        }
    }
}

impl From<OrderQueryDto> for SimpleOrderDto {
    fn from(dto: OrderQueryDto) -> Self {
        Self {
            order_id: dto.order_id,
            name: dto.name,
            order_date: dto.order_date,
            order_status: dto.order_status,
            address: dto.address,
        }
    }
}

/// Order projected straight from a query; `order_items` is filled in a
/// second step by the strategy that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryDto {
    pub order_id: ModelId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemQueryDto>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemQueryDto {
    /// Grouping key only.
    #[serde(skip)]
    pub order_id: ModelId,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// One row of the flat order/item projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlatDto {
    pub order_id: ModelId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// Regroups flat rows into one order per id, keeping the order in which
/// ids first appear and the row order of their items.
pub fn group_flat_rows(rows: Vec<OrderFlatDto>) -> Vec<OrderQueryDto> {
    let mut orders: Vec<OrderQueryDto> = Vec::new();
    let mut index = std::collections::HashMap::new();
    for row in rows {
        let item = OrderItemQueryDto {
            order_id: row.order_id,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        };
        let position = *index.entry(row.order_id).or_insert_with(|| {
            orders.push(OrderQueryDto {
                order_id: row.order_id,
                name: row.name,
                order_date: row.order_date,
                order_status: row.order_status,
                address: row.address,
                order_items: Vec::new(),
            });
            orders.len() - 1
        });
        orders[position].order_items.push(item);
    }
    orders
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: ModelId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl From<member::Model> for MemberDto {
    fn from(member: member::Model) -> Self {
        let address = member.address();
        Self {
            id: member.id,
            name: member.name,
            address,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: ModelId,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
}

impl From<item::Model> for ItemDto {
    fn from(item: item::Model) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            stock_quantity: item.stock_quantity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedId {
    pub id: ModelId,
}
