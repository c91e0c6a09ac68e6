//! A scoped database session: one pooled connection held for the lifetime of
//! a unit of work.

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

/// Wraps a transaction so every query of a unit of work runs on the same
/// connection.
///
/// `release` commits. Dropping the session without releasing it, including
/// when the owning future is cancelled, rolls back and returns the connection
/// to the pool.
pub struct ScopedSession {
    txn: DatabaseTransaction,
}

impl ScopedSession {
    pub async fn acquire(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        tracing::trace!("scoped session acquired");
        Ok(Self { txn })
    }

    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn release(self) -> Result<(), DbErr> {
        self.txn.commit().await?;
        tracing::trace!("scoped session released");
        Ok(())
    }
}
