#[allow(unused_imports)]
pub mod prelude {
    pub use super::user::Entity as User;
}

pub mod user;
