pub mod connection;
pub mod dao;
pub mod entities;
pub mod record;
pub mod session;

pub use connection::connect;
pub use session::ScopedSession;
