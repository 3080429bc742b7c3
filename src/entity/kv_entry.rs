//! Key-value entry model for Sea-ORM database interaction.
//!
//! Every key managed by [`SeaOrmStore`](crate::SeaOrmStore) (session hashes,
//! per-user session sets, revocation markers and version counters) lives in
//! one row of the `kv_entry` table.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one key in the database.
///
/// # Database Schema
///
/// | Column      | Type                    | Description                          |
/// |-------------|-------------------------|--------------------------------------|
/// | key         | TEXT (Primary Key)      | Store key, e.g. `sess:<jti>`         |
/// | value       | BYTEA / BLOB            | MessagePack encoded value            |
/// | expiry_date | TIMESTAMPTZ, nullable   | When the key expires; NULL = never   |
///
/// The table is created by the bundled
/// [`Migrator`](crate::migration::Migrator) when the `migration` feature is
/// enabled.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kv_entry")]
pub struct Model {
    /// The store key. Primary key of the table.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub key: String,

    /// The MessagePack encoding of the stored string, hash or set.
    pub value: Vec<u8>,

    /// Expiration timestamp. Rows past this instant are treated as absent
    /// and removed by `SeaOrmStore::delete_expired`.
    pub expiry_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the row is still visible at `now`.
    pub fn is_live(&self, now: DateTimeWithTimeZone) -> bool {
        self.expiry_date.map_or(true, |at| at > now)
    }
}
