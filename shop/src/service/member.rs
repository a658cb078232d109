use async_trait::async_trait;
use sea_orm::{ActiveValue::NotSet, IntoActiveModel, Set};
use tracing::{info, warn};

use crate::entities::member;
use crate::error::{ShopError, ShopResult};
use crate::model::{ModelId, NewMember};
use crate::service::ProdShopService;
use crate::storage::{MemberRepository, Session};

#[async_trait]
pub trait MemberService: Send + Sync {
    /// Registers a member, failing with `DuplicateMember` when the name is
    /// already taken.
    async fn join(&self, member: NewMember) -> ShopResult<ModelId>;
    async fn find_members(&self) -> ShopResult<Vec<member::Model>>;
    async fn find_member(&self, id: ModelId) -> ShopResult<member::Model>;
    async fn update_member_name(&self, id: ModelId, name: String) -> ShopResult<member::Model>;
}

async fn ensure_name_free(session: &Session, name: &str) -> ShopResult<()> {
    if !MemberRepository::find_by_name(session, name).await?.is_empty() {
        warn!(name, "Rejected duplicate member name");
        return Err(ShopError::DuplicateMember(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl MemberService for ProdShopService {
    async fn join(&self, new_member: NewMember) -> ShopResult<ModelId> {
        if new_member.name.trim().is_empty() {
            return Err(ShopError::InvalidArgument("member name must not be empty".to_string()));
        }

        let session = Session::begin(self.db(), "join_member").await?;
        ensure_name_free(&session, &new_member.name).await?;

        let address = new_member.address.as_ref();
        let model = member::ActiveModel {
            id: NotSet,
            name: Set(new_member.name.clone()),
            city: Set(address.map(|a| a.city().to_string())),
            street: Set(address.map(|a| a.street().to_string())),
            zipcode: Set(address.map(|a| a.zipcode().to_string())),
        };
        // The unique index still guards a concurrent join that passed the check.
        let saved = MemberRepository::save(&session, model)
            .await
            .map_err(|e| match e {
                ShopError::Database(db_err) => ShopError::from_member_write(db_err, &new_member.name),
                other => other,
            })?;

        session.commit().await?;
        info!(member_id = saved.id, name = %saved.name, "Member joined");
        Ok(saved.id)
    }

    async fn find_members(&self) -> ShopResult<Vec<member::Model>> {
        let session = Session::begin(self.db(), "find_members").await?;
        let mut members = MemberRepository::find_all(&session).await?;
        session.commit().await?;
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn find_member(&self, id: ModelId) -> ShopResult<member::Model> {
        let session = Session::begin(self.db(), "find_member").await?;
        let member = MemberRepository::find_one(&session, id).await?;
        session.commit().await?;
        Ok(member)
    }

    async fn update_member_name(&self, id: ModelId, name: String) -> ShopResult<member::Model> {
        if name.trim().is_empty() {
            return Err(ShopError::InvalidArgument("member name must not be empty".to_string()));
        }

        let session = Session::begin(self.db(), "update_member").await?;
        let current = MemberRepository::find_one(&session, id).await?;
        if current.name == name {
            session.commit().await?;
            return Ok(current);
        }
        ensure_name_free(&session, &name).await?;

        let mut model = current.into_active_model();
        model.name = Set(name.clone());
        let updated = MemberRepository::save(&session, model)
            .await
            .map_err(|e| match e {
                ShopError::Database(db_err) => ShopError::from_member_write(db_err, &name),
                other => other,
            })?;

        session.commit().await?;
        info!(member_id = id, name = %updated.name, "Member renamed");
        Ok(updated)
    }
}
