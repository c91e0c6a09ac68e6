use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{AuthError, password},
    db::dao::{DaoBase, DaoLayerError, NewUser, UserDao},
    db::entities::user,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern should compile")
});

const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 50;
const SETTING_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

/// Fields a user may edit on their own profile. `None` leaves the column as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

/// Trims and lowercases an email, rejecting anything that does not look like
/// `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AuthError::invalid_input("Invalid email address"));
    }
    Ok(email)
}

fn validate_name(field: &str, value: Option<String>) -> Result<Option<String>, AuthError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim().to_string();
    let len = value.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(AuthError::invalid_input(format!(
            "{field} must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(Some(value))
}

fn validate_setting(field: &str, value: Option<String>) -> Result<Option<String>, AuthError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim().to_string();
    if value.is_empty() || value.chars().count() > SETTING_MAX_LEN {
        return Err(AuthError::invalid_input(format!("{field} is invalid")));
    }
    Ok(Some(value))
}

/// Names coming from an identity provider are kept only when they would pass
/// local validation.
fn provider_name(value: Option<&str>) -> Option<String> {
    validate_name("name", value.map(str::to_string)).ok().flatten()
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn register(&self, account: NewAccount) -> Result<user::Model, AuthError> {
        let email = normalize_email(&account.email)?;
        let name = validate_name("name", account.name)?;
        let surname = validate_name("surname", account.surname)?;
        password::validate_password(&account.password)?;

        if self.user_dao.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let hash = password::hash_password(&account.password)?;
        let user = self
            .user_dao
            .create_user(NewUser {
                email,
                hashed_password: Some(hash),
                name,
                surname,
                ..Default::default()
            })
            .await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Creates a verified account without a local password.
    pub async fn create_oauth_user(
        &self,
        email: &str,
        name: Option<&str>,
        surname: Option<&str>,
    ) -> Result<user::Model, AuthError> {
        let email = normalize_email(email)?;
        let user = self
            .user_dao
            .create_user(NewUser {
                email,
                hashed_password: None,
                name: provider_name(name),
                surname: provider_name(surname),
                is_verified: true,
                is_superuser: false,
            })
            .await?;
        tracing::info!(user_id = %user.id, "user created from oauth profile");
        Ok(user)
    }

    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let email = normalize_email(email)?;
        let hash = password::hash_password(password)?;
        Ok(self
            .user_dao
            .create_user(NewUser {
                email,
                hashed_password: Some(hash),
                is_verified: true,
                is_superuser: true,
                ..Default::default()
            })
            .await?)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<user::Model>, AuthError> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthError> {
        let email = email.trim().to_lowercase();
        Ok(self.user_dao.find_by_email(&email).await?)
    }

    pub async fn record_login(&self, id: &Uuid) -> Result<user::Model, AuthError> {
        Ok(self
            .user_dao
            .set_last_login(id, &Utc::now().fixed_offset())
            .await?)
    }

    pub async fn update_profile(
        &self,
        id: &Uuid,
        update: ProfileUpdate,
    ) -> Result<user::Model, AuthError> {
        let name = validate_name("name", update.name)?;
        let surname = validate_name("surname", update.surname)?;
        let locale = validate_setting("locale", update.locale)?;
        let timezone = validate_setting("timezone", update.timezone)?;

        Ok(self
            .user_dao
            .update(*id, move |active| {
                if let Some(name) = name {
                    active.name = Set(Some(name));
                }
                if let Some(surname) = surname {
                    active.surname = Set(Some(surname));
                }
                if let Some(locale) = locale {
                    active.locale = Set(locale);
                }
                if let Some(timezone) = timezone {
                    active.timezone = Set(timezone);
                }
            })
            .await?)
    }

    /// Accounts that already have a local password must present it. Accounts
    /// created through OAuth set their first password without one.
    pub async fn change_password(
        &self,
        id: &Uuid,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.user_dao.find_by_id(*id).await?;
        if let Some(hash) = user.hashed_password.as_deref() {
            let current = current.ok_or(AuthError::Unauthorized)?;
            if !password::verify_password(current, hash)? {
                return Err(AuthError::Unauthorized);
            }
        }

        let hash = password::hash_password(new_password)?;
        self.user_dao.set_password_hash(id, hash).await?;
        tracing::info!(user_id = %id, "password changed");
        Ok(())
    }

    pub async fn mark_verified(&self, id: &Uuid) -> Result<user::Model, AuthError> {
        Ok(self.user_dao.set_verified(id).await?)
    }

    pub async fn set_active(&self, id: &Uuid, is_active: bool) -> Result<user::Model, AuthError> {
        let user = self.user_dao.set_active(id, is_active).await?;
        tracing::info!(user_id = %id, is_active, "user activation changed");
        Ok(user)
    }
}
