pub mod base;
mod context;
pub mod error;
pub mod user_dao;

pub use base::DaoBase;
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use user_dao::{NewUser, UserDao};
