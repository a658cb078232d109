use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::entities::{item, order_item};
use crate::error::{ShopError, ShopResult};
use crate::model::{ModelId, OrderLine};
use crate::storage::Session;

/// Number of parent keys grouped into one statement when a to-many
/// relation is loaded lazily.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchFetch {
    size: usize,
}

impl BatchFetch {
    pub fn new(size: u64) -> ShopResult<Self> {
        if size == 0 {
            return Err(ShopError::InvalidArgument("batch fetch size must be at least 1".to_string()));
        }
        Ok(Self { size: size as usize })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Statements needed to load `keys` parent keys.
    pub fn batches_for(&self, keys: usize) -> usize {
        keys.div_ceil(self.size)
    }
}

/// Loads the order lines of every order in `order_ids`.
///
/// Order items are fetched `batch.size()` orders per statement, then the
/// referenced catalog items the same way, so N orders with I distinct items
/// cost ceil(N/K) + ceil(I/K) statements. Every requested order gets an
/// entry, empty when it has no lines.
pub async fn load_order_lines(
    session: &Session,
    order_ids: &[ModelId],
    batch: BatchFetch,
) -> ShopResult<HashMap<ModelId, Vec<OrderLine>>> {
    let mut order_items = Vec::new();
    for chunk in order_ids.chunks(batch.size()) {
        debug!(orders = chunk.len(), "Batch loading order items");
        let rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(chunk.iter().copied()))
            .order_by_asc(order_item::Column::Id)
            .all(session)
            .await?;
        order_items.extend(rows);
    }

    let mut seen = HashSet::new();
    let item_ids: Vec<ModelId> = order_items
        .iter()
        .map(|oi| oi.item_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let mut items: HashMap<ModelId, item::Model> = HashMap::with_capacity(item_ids.len());
    for chunk in item_ids.chunks(batch.size()) {
        debug!(items = chunk.len(), "Batch loading items");
        let rows = item::Entity::find()
            .filter(item::Column::Id.is_in(chunk.iter().copied()))
            .all(session)
            .await?;
        items.extend(rows.into_iter().map(|it| (it.id, it)));
    }

    let mut lines: HashMap<ModelId, Vec<OrderLine>> =
        order_ids.iter().map(|id| (*id, Vec::new())).collect();
    for order_item in order_items {
        let item = items.get(&order_item.item_id).cloned().ok_or_else(|| {
            ShopError::DataIntegrity(format!(
                "order item {} references missing item {}",
                order_item.id, order_item.item_id
            ))
        })?;
        lines
            .entry(order_item.order_id)
            .or_default()
            .push(OrderLine { order_item, item });
    }

    Ok(lines)
}
