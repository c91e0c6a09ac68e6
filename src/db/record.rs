//! Shared shape of every persisted record: an immutable UUID plus
//! server-assigned `created_at`/`updated_at` timestamps.
//!
//! Entities opt in with `#[base_entity]`, which adds the columns and
//! implements these traits for the generated `ActiveModel`/`Entity`.

use sea_orm::entity::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

pub trait RecordEntity: sea_orm::EntityTrait {
    fn created_at_column() -> Self::Column;
}

pub trait RecordActiveModel {
    fn assign_id(&mut self, id: Uuid);

    /// Sets both timestamps for a row that is about to be inserted.
    fn stamp_created(&mut self, ts: DateTimeWithTimeZone);

    fn stamp_updated(&mut self, ts: DateTimeWithTimeZone);
}
