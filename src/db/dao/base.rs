use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, IntoActiveModel,
    PrimaryKeyTrait, QueryOrder, Select,
};
use uuid::Uuid;

use super::error::{DaoLayerError, DaoResult, is_unique_violation};
use crate::db::record::{RecordActiveModel, RecordEntity};

#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + RecordActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: RecordEntity,
{
    type Entity: EntityTrait + Send + Sync;

    /// Name used in `NotFound`/`Duplicate` errors.
    const ENTITY_NAME: &'static str;

    /// Column reported when an insert trips a unique constraint.
    const UNIQUE_FIELD: &'static str = "id";

    fn new(db: &DatabaseConnection) -> Self;

    fn db(&self) -> &DatabaseConnection;

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let mut active = data.into_active_model();
        active.assign_id(Uuid::new_v4());
        active.stamp_created(Utc::now().fixed_offset());
        active
            .insert(self.db())
            .await
            .map_err(Self::map_write_err)
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let model = Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        model.ok_or(DaoLayerError::NotFound {
            entity: Self::ENTITY_NAME,
            id,
        })
    }

    async fn find_one(
        &self,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>> {
        apply(Self::Entity::find())
            .order_by_desc(Self::Entity::created_at_column())
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = self.find_by_id(id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.stamp_updated(Utc::now().fixed_offset());

        active
            .update(self.db())
            .await
            .map_err(Self::map_write_err)
    }

    fn map_write_err(err: DbErr) -> DaoLayerError {
        if is_unique_violation(&err) {
            DaoLayerError::Duplicate {
                entity: Self::ENTITY_NAME,
                field: Self::UNIQUE_FIELD,
            }
        } else {
            DaoLayerError::Db(err)
        }
    }
}
