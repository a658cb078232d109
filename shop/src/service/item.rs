use async_trait::async_trait;
use sea_orm::{ActiveValue::NotSet, Set};
use tracing::info;

use crate::entities::item;
use crate::error::{ShopError, ShopResult};
use crate::model::{ModelId, NewItem};
use crate::service::ProdShopService;
use crate::storage::{ItemRepository, Session};

#[async_trait]
pub trait ItemService: Send + Sync {
    async fn save_item(&self, item: NewItem) -> ShopResult<ModelId>;
    /// Overwrites every field of an existing item.
    async fn update_item(&self, id: ModelId, item: NewItem) -> ShopResult<item::Model>;
    async fn find_items(&self) -> ShopResult<Vec<item::Model>>;
    async fn find_item(&self, id: ModelId) -> ShopResult<item::Model>;
}

fn validate(item: &NewItem) -> ShopResult<()> {
    if item.name.trim().is_empty() {
        return Err(ShopError::InvalidArgument("item name must not be empty".to_string()));
    }
    if item.price < 0 || item.stock_quantity < 0 {
        return Err(ShopError::InvalidArgument(format!(
            "item {} has negative price or stock",
            item.name
        )));
    }
    Ok(())
}

#[async_trait]
impl ItemService for ProdShopService {
    async fn save_item(&self, new_item: NewItem) -> ShopResult<ModelId> {
        validate(&new_item)?;
        let session = Session::begin(self.db(), "save_item").await?;
        let saved = ItemRepository::save(
            &session,
            item::ActiveModel {
                id: NotSet,
                name: Set(new_item.name),
                price: Set(new_item.price),
                stock_quantity: Set(new_item.stock_quantity),
            },
        )
        .await?;
        session.commit().await?;
        info!(item_id = saved.id, name = %saved.name, "Item registered");
        Ok(saved.id)
    }

    async fn update_item(&self, id: ModelId, new_item: NewItem) -> ShopResult<item::Model> {
        validate(&new_item)?;
        let session = Session::begin(self.db(), "update_item").await?;
        ItemRepository::find_one(&session, id).await?;
        let updated = ItemRepository::save(
            &session,
            item::ActiveModel {
                id: Set(id),
                name: Set(new_item.name),
                price: Set(new_item.price),
                stock_quantity: Set(new_item.stock_quantity),
            },
        )
        .await?;
        session.commit().await?;
        Ok(updated)
    }

    async fn find_items(&self) -> ShopResult<Vec<item::Model>> {
        let session = Session::begin(self.db(), "find_items").await?;
        let mut items = ItemRepository::find_all(&session).await?;
        session.commit().await?;
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn find_item(&self, id: ModelId) -> ShopResult<item::Model> {
        let session = Session::begin(self.db(), "find_item").await?;
        let item = ItemRepository::find_one(&session, id).await?;
        session.commit().await?;
        Ok(item)
    }
}
