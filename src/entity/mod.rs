//! Database entity models used by [`SeaOrmStore`](crate::SeaOrmStore).

/// The `kv_entry` table holding every stored key.
pub mod kv_entry;
