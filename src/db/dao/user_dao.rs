use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::User, user};

/// Column values for a brand-new user row. Everything not listed here takes
/// the entity default.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub is_verified: bool,
    pub is_superuser: bool,
}

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;
    const ENTITY_NAME: &'static str = "users";
    const UNIQUE_FIELD: &'static str = "email";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find_one(move |query| query.filter(user::Column::Email.eq(email)))
            .await
    }

    /// Looks a user up on an arbitrary connection, typically a scoped session.
    pub async fn find_by_id_on<C>(conn: &C, id: Uuid) -> DaoResult<Option<user::Model>>
    where
        C: ConnectionTrait,
    {
        User::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(new_user.email),
            hashed_password: Set(new_user.hashed_password),
            name: Set(new_user.name),
            surname: Set(new_user.surname),
            is_verified: Set(new_user.is_verified),
            is_active: Set(true),
            is_superuser: Set(new_user.is_superuser),
            locale: Set("en".to_string()),
            timezone: Set("UTC".to_string()),
            last_login: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_last_login(
        &self,
        id: &Uuid,
        at: &DateTime<FixedOffset>,
    ) -> DaoResult<user::Model> {
        let at = *at;
        self.update(*id, move |active| {
            active.last_login = Set(Some(at));
        })
        .await
    }

    pub async fn set_password_hash(&self, id: &Uuid, hash: String) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            active.hashed_password = Set(Some(hash));
        })
        .await
    }

    pub async fn set_active(&self, id: &Uuid, is_active: bool) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            active.is_active = Set(is_active);
        })
        .await
    }

    pub async fn set_verified(&self, id: &Uuid) -> DaoResult<user::Model> {
        self.update(*id, |active| {
            active.is_verified = Set(true);
        })
        .await
    }
}
