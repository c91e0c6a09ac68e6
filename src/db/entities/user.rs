use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    pub name: Option<String>,
    pub surname: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string; `None` for accounts created through OAuth.
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    #[sea_orm(default_value = false)]
    pub is_verified: bool,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,
    #[sea_orm(default_value = "en")]
    pub locale: String,
    #[sea_orm(default_value = "UTC")]
    pub timezone: String,
    pub last_login: Option<DateTimeWithTimeZone>,
}

impl ActiveModelBehavior for ActiveModel {}
