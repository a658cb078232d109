use serde::{Deserialize, Serialize};

use crate::entities::{delivery, item, member, order, order_item, OrderStatus};

pub type ModelId = i32;

/// Upper bound on rows returned by an order search.
pub const MAX_SEARCH_RESULTS: u64 = 1000;

/// Embedded address value object shared by members and deliveries.
///
/// Fields are fixed at construction; there are no setters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

impl Address {
    pub fn new(city: impl Into<String>, street: impl Into<String>, zipcode: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

/// A fully hydrated order aggregate: the order root with its to-one
/// relations and every order line resolved to its catalog item.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderGraph {
    pub order: order::Model,
    pub member: member::Model,
    pub delivery: delivery::Model,
    pub order_items: Vec<OrderLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_item: order_item::Model,
    pub item: item::Model,
}

/// Offset/limit window applied to the order root query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    /// Largest offset or limit the database drivers bind; they take signed
    /// 64-bit integers.
    pub const MAX_BOUND: u64 = i64::MAX as u64;

    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

/// Order search criteria; unset fields do not filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearch {
    /// Substring of the ordering member's name.
    pub member_name: Option<String>,
    pub order_status: Option<OrderStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub address: Option<Address>,
}

impl NewMember {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    pub fn with_address(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address: Some(address),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub item_id: ModelId,
    pub count: i32,
}
