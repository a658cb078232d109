use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityName, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait, QueryFilter, QueryOrder, TryIntoModel,
};
use std::marker::PhantomData;
use tracing::debug;

use crate::entities::{item, member};
use crate::error::{ShopError, ShopResult};
use crate::model::ModelId;
use crate::storage::Session;

/// Generic persistence operations shared by every entity keyed by `ModelId`.
///
/// The repository holds no connection or transaction state; the caller's
/// [`Session`] carries both.
pub struct EntityRepository<E>(PhantomData<E>);

impl<E> EntityRepository<E>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ModelId>,
{
    pub async fn find_one(session: &Session, id: ModelId) -> ShopResult<E::Model> {
        E::find_by_id(id)
            .one(session)
            .await?
            .ok_or_else(|| ShopError::NotFound {
                entity: E::default().table_name().to_string(),
                id,
            })
    }

    pub async fn find_all(session: &Session) -> ShopResult<Vec<E::Model>> {
        Ok(E::find().all(session).await?)
    }

    /// Inserts when the primary key is unset, otherwise writes every set
    /// column of the active model over the stored row.
    pub async fn save<A>(session: &Session, model: A) -> ShopResult<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + TryIntoModel<E::Model> + Send + 'static,
        E::Model: IntoActiveModel<A>,
    {
        debug!(entity = E::default().table_name(), "Saving entity");
        let saved = model.save(session).await?;
        Ok(saved.try_into_model()?)
    }
}

pub type MemberRepository = EntityRepository<member::Entity>;
pub type ItemRepository = EntityRepository<item::Entity>;

impl EntityRepository<member::Entity> {
    /// Members whose name matches exactly (case-sensitive).
    pub async fn find_by_name(session: &Session, name: &str) -> ShopResult<Vec<member::Model>> {
        Ok(member::Entity::find()
            .filter(member::Column::Name.eq(name))
            .order_by_asc(member::Column::Id)
            .all(session)
            .await?)
    }
}
