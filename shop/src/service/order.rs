use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, IntoActiveModel, ModelTrait, QueryOrder, Set};
use tracing::{info, warn};

use crate::entities::{delivery, order, order_item, DeliveryStatus, OrderStatus};
use crate::error::{ShopError, ShopResult};
use crate::model::{ModelId, OrderLineRequest, OrderSearch};
use crate::service::ProdShopService;
use crate::storage::{order_repository, EntityRepository, ItemRepository, MemberRepository, Session};

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Places an order for `member_id`, taking stock for every line.
    async fn order(&self, member_id: ModelId, lines: Vec<OrderLineRequest>) -> ShopResult<ModelId>;
    /// Cancels an order whose delivery has not completed and restores stock.
    async fn cancel(&self, order_id: ModelId) -> ShopResult<()>;
    async fn complete_delivery(&self, order_id: ModelId) -> ShopResult<()>;
    async fn search(&self, search: OrderSearch) -> ShopResult<Vec<order::Model>>;
}

async fn delivery_of(session: &Session, order: &order::Model) -> ShopResult<delivery::Model> {
    order
        .find_related(delivery::Entity)
        .one(session)
        .await?
        .ok_or_else(|| ShopError::DataIntegrity(format!("order {} has no delivery", order.id)))
}

#[async_trait]
impl OrderService for ProdShopService {
    async fn order(&self, member_id: ModelId, lines: Vec<OrderLineRequest>) -> ShopResult<ModelId> {
        if lines.is_empty() {
            return Err(ShopError::InvalidArgument("an order needs at least one line".to_string()));
        }
        if let Some(line) = lines.iter().find(|l| l.count <= 0) {
            return Err(ShopError::InvalidArgument(format!(
                "count for item {} must be positive, got {}",
                line.item_id, line.count
            )));
        }

        let session = Session::begin(self.db(), "place_order").await?;
        let member = MemberRepository::find_one(&session, member_id).await?;
        let address = member.address().ok_or_else(|| {
            ShopError::InvalidArgument(format!("member {} has no address to deliver to", member_id))
        })?;

        let delivery = EntityRepository::<delivery::Entity>::save(
            &session,
            delivery::ActiveModel {
                id: NotSet,
                city: Set(address.city().to_string()),
                street: Set(address.street().to_string()),
                zipcode: Set(address.zipcode().to_string()),
                status: Set(DeliveryStatus::Ready),
            },
        )
        .await?;

        let order = EntityRepository::<order::Entity>::save(
            &session,
            order::ActiveModel {
                id: NotSet,
                member_id: Set(member.id),
                delivery_id: Set(delivery.id),
                order_date: Set(Utc::now().naive_utc()),
                status: Set(OrderStatus::Ordered),
            },
        )
        .await?;

        for line in &lines {
            let mut item = ItemRepository::find_one(&session, line.item_id).await?;
            let order_price = item.price;
            item.remove_stock(line.count)?;

            let stock = item.stock_quantity;
            let mut active = item.into_active_model();
            active.stock_quantity = Set(stock);
            active.update(&session).await?;

            EntityRepository::<order_item::Entity>::save(
                &session,
                order_item::ActiveModel {
                    id: NotSet,
                    order_id: Set(order.id),
                    item_id: Set(line.item_id),
                    order_price: Set(order_price),
                    count: Set(line.count),
                },
            )
            .await?;
        }

        let statements = session.commit().await?;
        info!(order_id = order.id, member_id, lines = lines.len(), statements, "Order placed");
        Ok(order.id)
    }

    async fn cancel(&self, order_id: ModelId) -> ShopResult<()> {
        let session = Session::begin(self.db(), "cancel_order").await?;
        let order = EntityRepository::<order::Entity>::find_one(&session, order_id).await?;

        if order.status == OrderStatus::Cancelled {
            return Err(ShopError::OrderNotCancellable {
                order_id,
                reason: "already cancelled",
            });
        }
        if delivery_of(&session, &order).await?.status == DeliveryStatus::Completed {
            warn!(order_id, "Refused to cancel a delivered order");
            return Err(ShopError::OrderNotCancellable {
                order_id,
                reason: "delivery already completed",
            });
        }

        let order_items = order
            .find_related(order_item::Entity)
            .order_by_asc(order_item::Column::Id)
            .all(&session)
            .await?;
        for order_item in &order_items {
            let mut item = ItemRepository::find_one(&session, order_item.item_id).await?;
            item.add_stock(order_item.count);
            let stock = item.stock_quantity;
            let mut active = item.into_active_model();
            active.stock_quantity = Set(stock);
            active.update(&session).await?;
        }

        let mut active = order.into_active_model();
        active.status = Set(OrderStatus::Cancelled);
        active.update(&session).await?;

        session.commit().await?;
        info!(order_id, restored_lines = order_items.len(), "Order cancelled");
        Ok(())
    }

    async fn complete_delivery(&self, order_id: ModelId) -> ShopResult<()> {
        let session = Session::begin(self.db(), "complete_delivery").await?;
        let order = EntityRepository::<order::Entity>::find_one(&session, order_id).await?;
        let delivery = delivery_of(&session, &order).await?;

        if delivery.status != DeliveryStatus::Completed {
            let mut active = delivery.into_active_model();
            active.status = Set(DeliveryStatus::Completed);
            active.update(&session).await?;
        }

        session.commit().await?;
        info!(order_id, "Delivery completed");
        Ok(())
    }

    async fn search(&self, search: OrderSearch) -> ShopResult<Vec<order::Model>> {
        let session = Session::begin(self.db(), "search_orders").await?;
        let orders = order_repository::search(&session, &search, None).await?;
        session.commit().await?;
        Ok(orders)
    }
}
